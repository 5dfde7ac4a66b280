use anyhow::Result;
use engine::pipeline::{PipelineController, Snapshot};
use engine::records::RecordSource;
use engine::resolver::ScoreResolver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run,
    Leaderboard,
}

pub fn parse_args<I>(mut args: I) -> std::result::Result<Command, String>
where
    I: Iterator<Item = String>,
{
    // Drop argv[0].
    let _ = args.next();

    let Some(cmd) = args.next() else {
        return Ok(Command::Run);
    };

    match cmd.as_str() {
        "run" => Ok(Command::Run),
        "leaderboard" => Ok(Command::Leaderboard),
        other => Err(format!("unknown command: {other}")),
    }
}

/// One-shot leaderboard print, bypassing the web dashboard.
pub async fn print_leaderboard<S, R>(controller: &PipelineController<S, R>) -> Result<()>
where
    S: RecordSource + Sync,
    R: ScoreResolver + Sync,
{
    controller.refresh().await?;

    let rx = controller.subscribe();
    let snapshot = rx.borrow().clone();
    let Snapshot::Ready { entries, .. } = snapshot else {
        println!("no leaderboard data");
        return Ok(());
    };
    if entries.is_empty() {
        println!("no helpers recorded yet");
        return Ok(());
    }

    println!("{:<8} {:<44} {:>10}", "rank", "helper", "score");
    for e in &entries {
        println!(
            "{:<8} {:<44} {:>10}",
            e.medal.label(),
            e.address,
            e.score.normalize()
        );
    }
    Ok(())
}
