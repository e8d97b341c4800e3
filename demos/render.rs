//! Render SVG document into a PNG image
#![deny(warnings)]

use rasterize_svg::*;
use std::{
    env,
    fs::File,
    io::{BufWriter, Read, Write},
};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

type Error = Box<dyn std::error::Error>;

#[derive(Debug)]
struct Args {
    input_file: String,
    output_file: String,
    options: Options,
    frames: usize,
    clicks: Vec<(Scalar, Scalar)>,
}

impl Args {
    fn parse() -> Result<Args, Error> {
        let mut result = Args {
            input_file: String::new(),
            output_file: "-".to_owned(),
            options: Options::default(),
            frames: 1,
            clicks: Vec::new(),
        };
        let mut help = false;
        let mut args = env::args();
        let cmd = args.next().unwrap_or_else(|| "render".to_owned());
        while let Some(arg) = args.next() {
            match arg.as_ref() {
                "--help" => {
                    help = true;
                    break;
                }
                "-j" => {
                    let path = args.next().ok_or("-j requires argument")?;
                    let text = std::fs::read_to_string(path)?;
                    result.options = Options::from_json(&text)?;
                }
                "-w" => {
                    let width = args.next().ok_or("-w requires argument")?;
                    result.options.scale_width = Some(width.parse()?);
                }
                "-h" => {
                    let height = args.next().ok_or("-h requires argument")?;
                    result.options.scale_height = Some(height.parse()?);
                }
                "-f" => {
                    result.frames = args.next().ok_or("-f requires argument")?.parse()?;
                }
                "-o" => {
                    result.output_file = args.next().ok_or("-o requires argument")?;
                }
                "-c" => {
                    let point = args.next().ok_or("-c requires argument")?;
                    let (x, y) = point.split_once(',').ok_or("-c expects <x>,<y>")?;
                    result.clicks.push((x.trim().parse()?, y.trim().parse()?));
                }
                "-l" => {
                    result.options.log = true;
                }
                _ if result.input_file.is_empty() => result.input_file = arg,
                _ => return Err("unexpected positional argment".into()),
            }
        }
        if help || result.input_file.is_empty() {
            eprintln!("Render SVG document into a PNG image");
            eprintln!("\nUSAGE:");
            eprintln!(
                "    {} [-w <width>] [-h <height>] [-f <frames>] [-o <out.png>] [-j <options.json>] [-c <x,y>] [-l] <file.svg>",
                cmd
            );
            eprintln!("\nARGS:");
            eprintln!("    -w <width>         scale document to the width");
            eprintln!("    -h <height>        scale document to the height");
            eprintln!("    -f <frames>        number of animation frames to run (default: 1)");
            eprintln!("    -o <out.png>       output image in the PNG format (default: stdout)");
            eprintln!("    -j <options.json>  load rendering options from a JSON file");
            eprintln!("    -c <x,y>           click at the point before the last frame");
            eprintln!("    -l                 report unsupported constructs as warnings");
            eprintln!("    <file.svg>         SVG document ('-' means stdin)");
            std::process::exit(1);
        }
        Ok(result)
    }
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse()?;
    let mut renderer = tracing::debug_span!("[parse]").in_scope(|| {
        if args.input_file != "-" {
            Renderer::from_path(&args.input_file, args.options.clone())
        } else {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Renderer::from_str(&text, args.options.clone(), FsLoader::new("."))
        }
    })?;
    if !renderer.images_loaded() {
        tracing::warn!("some images are still pending, rendering without them");
        renderer.set_force_redraw(|| true);
    }

    let frames = args.frames.max(1);
    renderer.run(frames - 1);
    for (x, y) in args.clicks.iter().copied() {
        renderer.on_click(x, y);
    }
    if !renderer.tick(FRAME_INTERVAL) {
        renderer.draw();
    }
    for link in renderer.take_navigations() {
        tracing::info!(%link, "link activated");
    }
    tracing::debug!(frames = renderer.frames(), "[render]");

    let _save = tracing::debug_span!("[save]").entered();
    if args.output_file != "-" {
        let mut out = BufWriter::new(File::create(args.output_file)?);
        renderer.write_png(&mut out)?;
        out.flush()?;
    } else {
        let mut out = BufWriter::new(std::io::stdout());
        renderer.write_png(&mut out)?;
        out.flush()?;
    }
    Ok(())
}
