use anyhow::Context;
use chess_detector::app::{load_config, run_detection, DetectionConfig};
use chess_detector::logger;
use chess_detector::Localization;
use std::path::PathBuf;

const USAGE: &str = "usage: detect_features <image|config.json> [--no-blur] [--tolerance PX] \
                     [--radius R] [--com] [--log LEVEL]";

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let input: PathBuf = args.next().context(USAGE)?.into();

    let mut cfg = if input.extension().and_then(|e| e.to_str()) == Some("json") {
        load_config(&input)?
    } else {
        DetectionConfig::for_image(&input)
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--no-blur" => cfg.blur = false,
            "--com" => cfg.params.localization = Localization::CenterOfMass,
            "--tolerance" => {
                let v = args.next().context("expected a distance after --tolerance")?;
                cfg.outlier_tolerance = v
                    .parse()
                    .context("could not parse outlier tolerance (use a number >= 0)")?;
            }
            "--radius" => {
                let v = args.next().context("expected an integer after --radius")?;
                cfg.params.radius = v
                    .parse()
                    .context("could not parse radius (use integer >= 1)")?;
            }
            "--log" => {
                cfg.log_level = Some(args.next().context("expected a level after --log")?);
            }
            other => anyhow::bail!("unknown argument: {other}\n{USAGE}"),
        }
    }
    cfg.params.validate()?;

    #[cfg(feature = "tracing")]
    logger::init_tracing(cfg.log_level.as_deref().unwrap_or("info"), false);
    #[cfg(not(feature = "tracing"))]
    logger::init_from_name(cfg.log_level.as_deref())
        .map_err(|e| anyhow::anyhow!("installing logger: {e}"))?;

    let dump = run_detection(cfg)?;
    println!("image {}x{} pixels", dump.width, dump.height);
    println!("detect: {:5.2} ms", dump.detect_ms);
    match dump.error {
        Some(reason) => println!("no target: {reason}"),
        None => println!(
            "detected {} points of {} features, orientation {}",
            dump.points.len(),
            dump.features.len(),
            dump.orientation
        ),
    }

    Ok(())
}
