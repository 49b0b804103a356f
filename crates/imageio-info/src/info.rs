//! Image info report.
//!
//! Each input gets its own reader; files are described in parallel and
//! printed in argument order.

use crate::Cli;
use anyhow::{Context, Result, bail};
use half::f16;
use imageio::{FormatSpec, ImageInput};
use imageio_openexr::{ExrInputConfig, OpenExrInput};
use rayon::prelude::*;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Describes every input, printing reports to stdout and failures to stderr.
pub fn run(args: &Cli) -> Result<()> {
    let reports: Vec<Result<String>> = args
        .inputs
        .par_iter()
        .map(|path| describe(path, args))
        .collect();

    let mut failed = 0;
    for (path, report) in args.inputs.iter().zip(reports) {
        match report {
            Ok(text) => print!("{text}"),
            Err(err) => {
                failed += 1;
                eprintln!("iinfo: {}: {err:#}", path.display());
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} files could not be read", args.inputs.len());
    }
    Ok(())
}

/// Builds the report for one file.
fn describe(path: &Path, args: &Cli) -> Result<String> {
    let file_size = fs::metadata(path)
        .with_context(|| format!("cannot stat {}", path.display()))?
        .len();

    let mut input = OpenExrInput::with_config(ExrInputConfig {
        pedantic: args.pedantic,
    });
    if !input.valid_file(path) {
        bail!("not an {} file", input.format_name());
    }
    let spec = match input.open(path) {
        Ok(spec) => spec,
        Err(err) => {
            let detail = input.geterror();
            return Err(err).context(if detail.is_empty() { "open failed".into() } else { detail });
        }
    };

    let mut out = String::new();
    let nsubimages = input.nsubimages();
    writeln!(out, "{} : {}", path.display(), summary(&spec, input.format_name()))?;
    writeln!(out, "    channel list: {}", spec.channelnames.join(", "))?;
    if spec.is_tiled() {
        writeln!(out, "    tile size: {} x {}", spec.tile_width, spec.tile_height)?;
    }
    if spec.x != 0 || spec.y != 0 {
        writeln!(out, "    origin: {}, {}", spec.x, spec.y)?;
    }
    if nsubimages > 1 {
        writeln!(out, "    subimages: {nsubimages}")?;
    }
    writeln!(out, "    file size: {}", format_size(file_size))?;

    if args.all {
        for param in &spec.extra_attribs {
            writeln!(out, "    {}: {}", param.name, param.value)?;
        }
    }

    if args.subimages || args.verify {
        for index in 0..nsubimages {
            let level = input
                .seek_subimage(index as i32)
                .with_context(|| format!("cannot seek to subimage {index}"))?;
            if args.subimages {
                writeln!(out, "    subimage {index}: {} x {}", level.width, level.height)?;
            }
            if args.verify {
                let pixels = input.read_image().map_err(|err| {
                    let detail = input.geterror();
                    anyhow::Error::from(err).context(format!("subimage {index}: {detail}"))
                })?;
                let ranges = channel_ranges(&pixels, level.nchannels);
                for (name, (min, max)) in level.channelnames.iter().zip(ranges) {
                    writeln!(out, "    subimage {index} {name}: min {min:.6} max {max:.6}")?;
                }
            }
        }
    }

    input.close()?;
    Ok(out)
}

/// One-line summary: resolution, channel count, sample format and plugin.
fn summary(spec: &FormatSpec, format_name: &str) -> String {
    let plural = if spec.nchannels == 1 { "" } else { "s" };
    format!(
        "{} x {}, {} channel{plural}, {} {}",
        spec.width,
        spec.height,
        spec.nchannels,
        spec.format,
        format_name.to_lowercase()
    )
}

/// Min and max of every channel of interleaved native-endian half pixels.
fn channel_ranges(data: &[u8], nchannels: usize) -> Vec<(f32, f32)> {
    let mut ranges = vec![(f32::INFINITY, f32::NEG_INFINITY); nchannels];
    if nchannels == 0 {
        return ranges;
    }
    for (i, sample) in data.chunks_exact(2).enumerate() {
        let value = f16::from_ne_bytes([sample[0], sample[1]]).to_f32();
        let (min, max) = &mut ranges[i % nchannels];
        *min = min.min(value);
        *max = max.max(value);
    }
    ranges
}

/// Formats byte size in human-readable form.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageio::DataFormat;

    fn halves(values: &[f32]) -> Vec<u8> {
        values
            .iter()
            .flat_map(|v| f16::from_f32(*v).to_ne_bytes())
            .collect()
    }

    #[test]
    fn test_channel_ranges() {
        let data = halves(&[0.0, 1.0, 0.5, -2.0, 4.0, 0.25]);
        let ranges = channel_ranges(&data, 2);
        assert_eq!(ranges, [(0.0, 4.0), (-2.0, 1.0)]);
    }

    #[test]
    fn test_channel_ranges_no_channels() {
        assert!(channel_ranges(&[0, 0], 0).is_empty());
    }

    #[test]
    fn test_summary() {
        let spec = FormatSpec::new(64, 32, 4, DataFormat::F16);
        assert_eq!(summary(&spec, "OpenEXR"), "64 x 32, 4 channels, half openexr");
        let spec = FormatSpec::new(8, 8, 1, DataFormat::F16);
        assert!(summary(&spec, "OpenEXR").contains("1 channel,"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
