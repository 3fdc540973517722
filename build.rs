use anyhow::{anyhow, Context};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::{env, fs};

const SHADER_DIR: &str = "shaders";

fn main() -> anyhow::Result<()> {
    let profile = env::var("PROFILE")?;
    let target_dir = env::var("CARGO_TARGET_DIR").unwrap_or_else(|_| "target".to_string());
    let shader_out_dir = PathBuf::from(format!("{target_dir}/{profile}/{SHADER_DIR}"));
    if !shader_out_dir.exists() {
        fs::create_dir_all(&shader_out_dir)?;
    }

    let shader_source_dir = PathBuf::from(SHADER_DIR);
    compile_shaders(&shader_source_dir, &shader_out_dir)?;

    println!("cargo:rerun-if-changed={SHADER_DIR}");
    Ok(())
}

fn compile_shaders(source_dir: &Path, output_dir: &Path) -> anyhow::Result<()> {
    for entry in fs::read_dir(source_dir)? {
        let entry = entry?;
        let path = entry.path();

        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            continue;
        };
        if !matches!(extension, "vert" | "frag") {
            continue;
        }

        let file_name = entry
            .file_name()
            .into_string()
            .map_err(|name| anyhow!("invalid shader filename {:?}", name))?;
        let spirv_path = output_dir.join(format!("{file_name}.spv"));

        // The library and its tests do not need SPIR-V, only the windowed app does.
        let status = match Command::new("glslang")
            .arg("-V")
            .arg(&path)
            .arg("-o")
            .arg(&spirv_path)
            .status()
        {
            Ok(status) => status,
            Err(err) => {
                println!("cargo:warning=glslang unavailable, skipping {file_name}: {err}");
                continue;
            }
        };

        if !status.success() {
            return Err(anyhow!("Failed to compile shader: {:?}", file_name))
                .context(format!("glslang exited with {status}"));
        }
        println!("cargo:rerun-if-changed={}", path.display());
    }

    Ok(())
}
