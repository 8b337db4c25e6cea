use std::path::Path;
use std::process::Command;

use slidecast_media::{check_ffmpeg, check_ffprobe};
use slidecast_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();

    println!("slidecast-selfcheck: starting with work_dir={}", config.work_dir);
    ensure_workdir(&config.work_dir).await?;
    ensure_tool("ffmpeg", check_ffmpeg()?.as_path())?;
    ensure_tool("ffprobe", check_ffprobe()?.as_path())?;
    if std::env::var("ELEVENLABS_VOICE_ID").is_err() {
        println!("slidecast-selfcheck: ELEVENLABS_VOICE_ID not set, pass --voice-id to runs");
    }

    println!("slidecast-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    let probe = path.join(".selfcheck");
    tokio::fs::write(&probe, b"ok").await?;
    tokio::fs::remove_file(&probe).await?;
    Ok(())
}

fn ensure_tool(name: &str, path: &Path) -> anyhow::Result<()> {
    let output = Command::new(path)
        .arg("-version")
        .output()
        .map_err(|e| anyhow::anyhow!("{} not runnable: {}", name, e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("{} -version failed: {:?}", name, output.status));
    }

    let version = String::from_utf8_lossy(&output.stdout);
    if let Some(first) = version.lines().next() {
        println!("slidecast-selfcheck: {}", first);
    }
    Ok(())
}
