//! Writing metadata into image files with ExifTool.
//!
//! ExifTool is treated as an opaque external program: we build the argument
//! list, run it, and report its exit status and output.

use std::path::Path;

use async_trait::async_trait;

use crate::config::ExifToolConfig;
use crate::error::PipelineError;
use crate::types::StockMetadata;

/// Destination for generated metadata.
///
/// Uses `async_trait` so the batch runner can hold an `Arc<dyn MetadataWriter>`.
#[async_trait]
pub trait MetadataWriter: Send + Sync {
    /// Writer name for logging.
    fn name(&self) -> &str;

    /// Write title, description and keywords into the file at `path`.
    async fn write(&self, path: &Path, metadata: &StockMetadata) -> Result<(), PipelineError>;
}

/// Runs `exiftool` (optionally through `wsl`).
#[derive(Debug, Clone)]
pub struct ExifTool {
    program: String,
    leading_args: Vec<String>,
    extra_args: Vec<String>,
    wsl: bool,
    dry_run: bool,
}

impl ExifTool {
    pub fn from_config(config: &ExifToolConfig) -> Self {
        let (program, leading_args) = if config.wsl {
            ("wsl".to_string(), vec![config.program.clone()])
        } else {
            (config.program.clone(), Vec::new())
        };
        Self {
            program,
            leading_args,
            extra_args: config.extra_args.clone(),
            wsl: config.wsl,
            dry_run: false,
        }
    }

    /// Log the command instead of running it.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run `exiftool -ver` and return the reported version.
    pub async fn version(&self) -> Result<String, PipelineError> {
        let mut args = self.leading_args.clone();
        args.push("-ver".to_string());
        let output = self.run(&args, Path::new("")).await?;
        Ok(output.trim().to_string())
    }

    /// Full argument list (after the program) for writing `metadata` to `path`.
    pub fn build_args(&self, path: &Path, metadata: &StockMetadata) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.extend(self.extra_args.iter().cloned());
        args.push(format!("-XMP-dc:Title={}", metadata.title));
        args.push(format!("-XMP-dc:Description={}", metadata.description));
        args.push(format!("-XMP-dc:Subject={}", metadata.keywords));
        args.push("-overwrite_original".to_string());
        args.push("-charset".to_string());
        args.push("UTF8".to_string());
        args.push("-m".to_string());
        args.push(self.target_path(path));
        args
    }

    fn target_path(&self, path: &Path) -> String {
        let path = path.to_string_lossy();
        if self.wsl {
            to_wsl_path(&path)
        } else {
            path.into_owned()
        }
    }

    /// Run the program and return stdout, mapping failures to `PipelineError::Writer`.
    async fn run(&self, args: &[String], path: &Path) -> Result<String, PipelineError> {
        let output = tokio::process::Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|e| PipelineError::Writer {
                path: path.to_path_buf(),
                message: if e.kind() == std::io::ErrorKind::NotFound {
                    format!(
                        "'{}' not found. Install ExifTool (or enable exiftool.wsl on Windows)",
                        self.program
                    )
                } else {
                    format!("failed to start '{}': {e}", self.program)
                },
                exit_code: None,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let detail = if stderr.trim().is_empty() {
                stdout.trim()
            } else {
                stderr.trim()
            };
            return Err(PipelineError::Writer {
                path: path.to_path_buf(),
                message: format!(
                    "{detail} [exit code {}]",
                    output
                        .status
                        .code()
                        .map_or_else(|| "none".to_string(), |c| c.to_string())
                ),
                exit_code: output.status.code(),
            });
        }

        if !stderr.trim().is_empty() {
            tracing::debug!("ExifTool stderr: {}", stderr.trim());
        }
        Ok(stdout)
    }
}

#[async_trait]
impl MetadataWriter for ExifTool {
    fn name(&self) -> &str {
        "exiftool"
    }

    async fn write(&self, path: &Path, metadata: &StockMetadata) -> Result<(), PipelineError> {
        let args = self.build_args(path, metadata);
        if self.dry_run {
            tracing::info!("[dry run] {} {}", self.program, args.join(" "));
            return Ok(());
        }

        tracing::debug!("Running {} {}", self.program, args.join(" "));
        let stdout = self.run(&args, path).await?;
        tracing::debug!("ExifTool stdout: {}", stdout.trim());
        Ok(())
    }
}

/// Translate a Windows drive path (`C:\dir\a.jpg`) to its WSL mount
/// (`/mnt/c/dir/a.jpg`). Other paths only get their separators normalized.
pub fn to_wsl_path(path: &str) -> String {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        let drive = (bytes[0] as char).to_ascii_lowercase();
        let rest = path[2..].replace('\\', "/");
        let rest = rest.trim_start_matches('/');
        if rest.is_empty() {
            format!("/mnt/{drive}")
        } else {
            format!("/mnt/{drive}/{rest}")
        }
    } else {
        path.replace('\\', "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> StockMetadata {
        StockMetadata {
            title: "Lighthouse at dusk".to_string(),
            description: "A lighthouse, waves, pink sky".to_string(),
            keywords: "lighthouse, coast, dusk".to_string(),
        }
    }

    #[test]
    fn test_build_args_plain() {
        let tool = ExifTool::from_config(&ExifToolConfig::default());
        let args = tool.build_args(Path::new("/photos/a.jpg"), &metadata());
        assert_eq!(
            args,
            vec![
                "-XMP-dc:Title=Lighthouse at dusk",
                "-XMP-dc:Description=A lighthouse, waves, pink sky",
                "-XMP-dc:Subject=lighthouse, coast, dusk",
                "-overwrite_original",
                "-charset",
                "UTF8",
                "-m",
                "/photos/a.jpg",
            ]
        );
    }

    #[test]
    fn test_build_args_wsl() {
        let tool = ExifTool::from_config(&ExifToolConfig {
            wsl: true,
            extra_args: vec!["-P".to_string()],
            ..ExifToolConfig::default()
        });
        let args = tool.build_args(Path::new(r"C:\Users\ana\shots\b.png"), &metadata());
        assert_eq!(tool.program, "wsl");
        assert_eq!(args[0], "exiftool");
        assert_eq!(args[1], "-P");
        assert_eq!(args.last().unwrap(), "/mnt/c/Users/ana/shots/b.png");
    }

    #[test]
    fn test_wsl_path_translation() {
        assert_eq!(to_wsl_path(r"D:\a\b.tif"), "/mnt/d/a/b.tif");
        assert_eq!(to_wsl_path("C:/x/y.jpg"), "/mnt/c/x/y.jpg");
        assert_eq!(to_wsl_path("C:"), "/mnt/c");
        assert_eq!(to_wsl_path("/home/u/a.jpg"), "/home/u/a.jpg");
    }

    #[tokio::test]
    async fn test_missing_program_is_writer_error() {
        let tool = ExifTool::from_config(&ExifToolConfig {
            program: "definitely-not-exiftool-xyz".to_string(),
            ..ExifToolConfig::default()
        });
        let err = tool.version().await.unwrap_err();
        assert!(matches!(err, PipelineError::Writer { exit_code: None, .. }));
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_dry_run_does_not_spawn() {
        let tool = ExifTool::from_config(&ExifToolConfig {
            program: "definitely-not-exiftool-xyz".to_string(),
            ..ExifToolConfig::default()
        })
        .with_dry_run(true);
        assert!(tool
            .write(Path::new("/tmp/none.jpg"), &metadata())
            .await
            .is_ok());
    }
}
