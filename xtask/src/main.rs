use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_PACKAGE: &str = "gift_draw_lambda";
const LAMBDA_BIN: &str = "draw_runtime";

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the gift draw workspace",
    long_about = "Runs CI checks and packages the draw Lambda for deployment."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks
    Ci {
        #[arg(value_enum, default_value_t = CiJob::All)]
        job: CiJob,
    },
    /// Run the workspace test suite
    Test {
        /// Only test this crate
        #[arg(long, short)]
        package: Option<String>,
    },
    /// Build the draw Lambda and zip it as a `bootstrap` artifact
    ServerlessPackage {
        /// Compilation target triple for the Lambda binary
        #[arg(
            long,
            env = "DRAW_LAMBDA_TARGET",
            default_value = "x86_64-unknown-linux-gnu"
        )]
        target: String,
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Directory the zip is written to
        #[arg(long, default_value = "dist")]
        out_dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CiJob {
    /// rustfmt in check mode
    Fmt,
    /// clippy with warnings denied
    Lint,
    Test,
    /// fmt + lint + test
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn run_ci(job: CiJob) {
    let (fmt, lint, test) = match job {
        CiJob::Fmt => (true, false, false),
        CiJob::Lint => (false, true, false),
        CiJob::Test => (false, false, true),
        CiJob::All => (true, true, true),
    };

    if fmt {
        step("Check formatting");
        run_cargo(&["fmt", "--all", "--", "--check"]);
    }
    if lint {
        step("Clippy");
        run_cargo(&[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ]);
    }
    if test {
        step("Test workspace");
        run_cargo(&["test", "--workspace"]);
    }
}

fn package_draw_lambda(target: &str, profile: BuildProfile, out_dir: &Path) {
    ensure_rust_target_installed(target);

    step("Build draw Lambda binary");
    let mut args = vec![
        "build",
        "-p",
        LAMBDA_PACKAGE,
        "--target",
        target,
        "--bin",
        LAMBDA_BIN,
    ];
    if let Some(flag) = profile.cargo_flag() {
        args.push(flag);
    }
    run_cargo(&args);

    step("Package Lambda zip");
    let binary_path = Path::new("target")
        .join(target)
        .join(profile.dir_name())
        .join(binary_name(LAMBDA_BIN, target));
    fs::create_dir_all(out_dir).expect("failed to create dist directory");
    let zip_path = out_dir.join(format!("{LAMBDA_BIN}.zip"));

    write_bootstrap_zip(&binary_path, &zip_path);
    eprintln!("\nPackaged artifact: {}", zip_path.display());
}

fn ensure_rust_target_installed(target: &str) {
    let output = match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(value) => value,
        Err(error) => {
            eprintln!(
                "warning: could not query installed rust targets ({error}); skipping check"
            );
            return;
        }
    };

    let installed = String::from_utf8_lossy(&output.stdout);
    if output.status.success() && !installed.lines().any(|line| line.trim() == target) {
        eprintln!(
            "error: rust target `{target}` is not installed; run `rustup target add {target}`"
        );
        exit(1);
    }
}

fn binary_name(bin: &str, target: &str) -> String {
    if target.contains("windows") {
        format!("{bin}.exe")
    } else {
        bin.to_string()
    }
}

// The provided.al2023 runtime executes the archive entry named `bootstrap`.
fn write_bootstrap_zip(binary_path: &Path, zip_path: &Path) {
    let binary = fs::read(binary_path).unwrap_or_else(|error| {
        panic!(
            "failed to read Lambda binary at '{}': {error}",
            binary_path.display()
        )
    });

    let file = fs::File::create(zip_path).expect("failed to create Lambda zip");
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)
        .expect("failed to start bootstrap entry");
    zip.write_all(&binary)
        .expect("failed to write bootstrap entry");
    zip.finish().expect("failed to finish Lambda zip");
}

fn main() {
    match Cli::parse().command {
        Commands::Ci { job } => {
            run_ci(job);
            eprintln!("\nCI job passed.");
        }
        Commands::Test { package } => match package.as_deref() {
            Some(name) => run_cargo(&["test", "-p", name]),
            None => run_cargo(&["test", "--workspace"]),
        },
        Commands::ServerlessPackage {
            target,
            profile,
            out_dir,
        } => package_draw_lambda(&target, profile, &out_dir),
    }
}
