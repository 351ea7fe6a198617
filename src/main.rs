mod args;

use args::Args;
use puzzle_locator::service::{ApiResponse, RegisterPuzzleRequest, ResponseBody};
use puzzle_locator::{PuzzleService, ServiceConfig};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

fn main() -> ExitCode {
    let Some(args) = Args::parse() else {
        return ExitCode::SUCCESS;
    };

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.debug {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("❌ Failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    rt.block_on(run(args))
}

async fn run(args: Args) -> ExitCode {
    let mut config = ServiceConfig::default();
    config.locate.debug_enabled = args.debug;
    if let Some(secs) = args.timeout_secs {
        config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    let service = PuzzleService::new(config);

    let puzzle = match tokio::fs::read(&args.puzzle).await {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("❌ Cannot read puzzle {}: {e}", args.puzzle.display());
            return ExitCode::FAILURE;
        }
    };
    let registered = service
        .register_puzzle(RegisterPuzzleRequest {
            puzzle: Some(puzzle),
        })
        .await;
    print_response(&registered);
    let ResponseBody::Registered { session_id, .. } = &registered.body else {
        return ExitCode::FAILURE;
    };

    if let Some(dir) = &args.out_dir {
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            eprintln!("❌ Cannot create output directory {}: {e}", dir.display());
            return ExitCode::FAILURE;
        }
    }

    let mut missed = 0usize;
    for piece_path in &args.pieces {
        let piece = match tokio::fs::read(piece_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("❌ Cannot read piece {}: {e}", piece_path.display());
                missed += 1;
                continue;
            }
        };

        log::info!("🔍 Locating {}", piece_path.display());
        match service
            .locate(Some(session_id.as_str()), Some(piece.as_slice()))
            .await
        {
            Ok(located) => {
                print_response(&ApiResponse::located(&located));
                if let Some(dir) = &args.out_dir {
                    let target = overlay_path(dir, piece_path);
                    match tokio::fs::write(&target, &located.overlay_png).await {
                        Ok(()) => log::info!("💾 Overlay saved to {}", target.display()),
                        Err(e) => eprintln!("❌ Write failed for {}: {e}", target.display()),
                    }
                }
            }
            Err(e) => {
                log::warn!("⚠️ {}: {e}", piece_path.display());
                print_response(&ApiResponse::from_error(&e));
                missed += 1;
            }
        }
    }

    if missed > 0 {
        log::warn!("{missed} of {} pieces not located", args.pieces.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_response(response: &ApiResponse) {
    match response.to_json() {
        Ok(json) => println!("{} {json}", response.status),
        Err(e) => eprintln!("❌ Failed to serialize response: {e}"),
    }
}

fn overlay_path(dir: &Path, piece: &Path) -> std::path::PathBuf {
    let stem = piece
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "piece".to_string());
    dir.join(format!("{stem}-located.png"))
}
