use anyhow::Context;
use minisnip::{clipboard, encode, Minisnip, Rect};
use std::env;
use std::path::PathBuf;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{:#}", e);
        eprintln!("minisnip: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let Some(opts) = parse_args(env::args().skip(1))? else {
        print_help();
        return Ok(());
    };

    let mut snip = Minisnip::new().context("failed to connect to the compositor")?;
    log::debug!("Virtual screen: {}", snip.virtual_screen());

    let capture = if opts.whole_screen {
        snip.capture_all().context("failed to capture the whole screen")?
    } else {
        let region = match opts.geometry {
            Some(region) => region,
            None => match snip.select_region().context("region selection failed")? {
                Some(region) => region,
                None => {
                    log::info!("Nothing captured");
                    return Ok(());
                }
            },
        };
        snip.capture_region(region)
            .with_context(|| format!("failed to capture {}", region))?
    };

    let path = encode::default_output_path(opts.output_dir.as_deref());
    capture
        .save_png(&path)
        .with_context(|| format!("failed to save {}", path.display()))?;
    println!("{}", path.display());

    if opts.clipboard {
        clipboard::copy_image(&capture, opts.wait_for_paste)
            .context("failed to copy the image to the clipboard")?;
    }

    Ok(())
}

#[derive(Debug)]
struct Options {
    output_dir: Option<PathBuf>,
    geometry: Option<Rect>,
    whole_screen: bool,
    clipboard: bool,
    wait_for_paste: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            output_dir: None,
            geometry: None,
            whole_screen: false,
            clipboard: true,
            wait_for_paste: true,
        }
    }
}

/// `Ok(None)` means help was requested.
fn parse_args<I>(args: I) -> anyhow::Result<Option<Options>>
where
    I: IntoIterator<Item = String>,
{
    let mut opts = Options::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "-d" => {
                let dir = args.next().context("-d requires an argument")?;
                opts.output_dir = Some(PathBuf::from(dir));
            }
            "-g" => {
                let geometry = args.next().context("-g requires an argument")?;
                opts.geometry = Some(
                    geometry
                        .parse()
                        .with_context(|| format!("invalid geometry '{}'", geometry))?,
                );
            }
            "-a" => opts.whole_screen = true,
            "-n" => opts.clipboard = false,
            "--no-wait" => opts.wait_for_paste = false,
            other => anyhow::bail!("unknown argument: {}", other),
        }
    }

    if opts.whole_screen && opts.geometry.is_some() {
        anyhow::bail!("-a and -g cannot be combined");
    }

    Ok(Some(opts))
}

fn print_help() {
    println!(
        "Usage: minisnip [options...]\n\
         \n\
         Drag a rectangle with the left mouse button to capture it. Escape cancels.\n\
         The capture is saved as a PNG (its path is printed) and copied to the clipboard.\n\
         \n\
         Options:\n\
         -h, --help      Show help message and quit.\n\
         -d <dir>        Save the PNG in <dir> instead of the temp directory.\n\
         -g <geometry>   Capture \"x,y wxh\" directly, without the overlay.\n\
         -a              Capture every output, without the overlay.\n\
         -n              Do not copy to the clipboard.\n\
         --no-wait       Do not keep serving the clipboard until it is taken over.\n\
         \n\
         Set RUST_LOG=debug for protocol-level logging."
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<Option<Options>> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn defaults_copy_and_wait() {
        let opts = parse(&[]).unwrap().unwrap();
        assert!(opts.clipboard);
        assert!(opts.wait_for_paste);
        assert!(opts.geometry.is_none());
        assert!(!opts.whole_screen);
        assert!(opts.output_dir.is_none());
    }

    #[test]
    fn parses_all_flags() {
        let opts = parse(&["-d", "/tmp/snips", "-g", "10,20 30x40", "-n", "--no-wait"])
            .unwrap()
            .unwrap();
        assert_eq!(opts.output_dir, Some(PathBuf::from("/tmp/snips")));
        assert_eq!(opts.geometry, Some(Rect::new(10, 20, 30, 40)));
        assert!(!opts.clipboard);
        assert!(!opts.wait_for_paste);
    }

    #[test]
    fn whole_screen_flag() {
        let opts = parse(&["-a", "-n"]).unwrap().unwrap();
        assert!(opts.whole_screen);
        assert!(opts.geometry.is_none());

        assert!(parse(&["-a", "-g", "0,0 10x10"]).is_err());
    }

    #[test]
    fn help_short_circuits() {
        assert!(parse(&["-n", "--help"]).unwrap().is_none());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse(&["-d"]).is_err());
        assert!(parse(&["-g", "nope"]).is_err());
        assert!(parse(&["--frobnicate"]).is_err());
    }
}
