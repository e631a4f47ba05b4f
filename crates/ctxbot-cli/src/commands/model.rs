use std::io::Write;

use anyhow::Context;

use ctxbot_lib::embedding::embedder::{HF_REPO, MODEL_FILES, MODEL_SUBDIR};
use ctxbot_lib::output::ConsoleIO;
use ctxbot_lib::runtime::Runtime;

/// Run the `ctxbot model download` command.
pub fn run_model_download<IO: ConsoleIO>(
    force: bool,
    runtime: &Runtime,
    io: &mut IO,
) -> anyhow::Result<()> {
    let model_dir = runtime.settings.model_dir.join(MODEL_SUBDIR);

    if force && model_dir.exists() {
        writeln!(io.stderr(), "Removing existing model files...")?;
        std::fs::remove_dir_all(&model_dir)
            .with_context(|| format!("Failed to remove {}", model_dir.display()))?;
    }

    if !force
        && MODEL_FILES
            .iter()
            .all(|(_, local)| model_dir.join(local).exists())
    {
        writeln!(
            io.stdout(),
            "Model already downloaded at {}",
            model_dir.display()
        )?;
        return Ok(());
    }

    std::fs::create_dir_all(&model_dir)
        .with_context(|| format!("Failed to create {}", model_dir.display()))?;

    writeln!(io.stderr(), "Downloading all-MiniLM-L6-v2...")?;
    let api = hf_hub::api::sync::Api::new()?;
    let repo = api.model(HF_REPO.to_string());

    for (remote_path, local_name) in MODEL_FILES {
        let dest = model_dir.join(local_name);
        if dest.exists() {
            writeln!(io.stderr(), "  {local_name} (cached)")?;
            continue;
        }
        writeln!(io.stderr(), "  {local_name}...")?;
        let cached = repo
            .get(remote_path)
            .with_context(|| format!("Failed to download {remote_path} from {HF_REPO}"))?;
        std::fs::copy(&cached, &dest)?;
    }

    writeln!(io.stdout(), "Model downloaded to {}", model_dir.display())?;
    Ok(())
}
