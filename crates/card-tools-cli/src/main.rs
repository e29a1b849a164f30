use anyhow::{Context, Result, bail};
use card_sheet::{
    BackSelector, CardSize, LayoutCatalog, OffsetData, OutputTarget, PaperSize, Registration,
    SheetOptions,
};
use clap::{Parser, Subcommand, ValueEnum};
use pnp_extract::ExtractOptions;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cardt", about = "Card proxy sheet tools", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lay card images out on printable sheets
    Build {
        /// Options file (JSON); flags given on the command line override it
        #[arg(long)]
        options: Option<PathBuf>,

        /// Directory of card fronts
        #[arg(long)]
        front: Option<PathBuf>,

        /// Directory holding the shared card back
        #[arg(long)]
        back: Option<PathBuf>,

        /// Directory of per-card backs, named like their fronts
        #[arg(long)]
        double_sided: Option<PathBuf>,

        /// Output PDF file, or directory with --images
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write numbered PNG pages instead of a PDF
        #[arg(long)]
        images: bool,

        /// Card size
        #[arg(long, value_enum)]
        card: Option<CardArg>,

        /// Paper size
        #[arg(long, value_enum)]
        paper: Option<PaperArg>,

        /// Number of registration marks
        #[arg(long, value_enum)]
        registration: Option<RegistrationArg>,

        /// Render fronts only, without back pages
        #[arg(long)]
        fronts_only: bool,

        /// Crop per card edge: percent (`6.5`), or `3mm` / `0.125in`
        #[arg(long)]
        crop: Option<String>,

        /// Pixels trimmed from every card edge before bleeding
        #[arg(long)]
        extend_corners: Option<u32>,

        /// Requested bleed in pixels at 300 ppi, as `X,Y`
        #[arg(long, value_parser = parse_pair)]
        bleed: Option<(u32, u32)>,

        /// Output resolution in pixels per inch
        #[arg(long)]
        ppi: Option<u32>,

        /// JPEG quality of PDF pages (1-100)
        #[arg(long)]
        quality: Option<u8>,

        /// Grid cells left empty on every page (0-based)
        #[arg(long, value_delimiter = ',')]
        skip: Vec<usize>,

        /// Apply the saved duplex offset to back pages
        #[arg(long)]
        load_offset: bool,

        /// Deck name printed in the sheet label
        #[arg(long)]
        name: Option<String>,

        /// Alternative layout catalog (JSON)
        #[arg(long)]
        layouts: Option<PathBuf>,

        /// Directory with registration mark images
        #[arg(long)]
        assets: Option<PathBuf>,

        /// TrueType font for labels on PNG pages
        #[arg(long)]
        label_font: Option<PathBuf>,
    },

    /// Pull card images out of a print-and-play PDF or folder of PDFs
    Extract {
        /// PDF file or folder
        input: PathBuf,

        /// Options file (JSON); flags given on the command line override it
        #[arg(long)]
        options: Option<PathBuf>,

        /// Root of the front/, back/ and double_sided/ folders
        #[arg(short, long)]
        output_root: Option<PathBuf>,

        /// Expected grid, e.g. 3x3 (auto-detected otherwise)
        #[arg(long)]
        grid: Option<String>,

        /// Back pages list cards in reverse order
        #[arg(long)]
        short_edge_flip: bool,

        /// Minimum image width and height in pixels
        #[arg(long)]
        min_dimension: Option<u32>,

        /// Pages to ignore, e.g. 1,3-5,7
        #[arg(long)]
        skip_pages: Option<String>,

        /// Treat every page as fronts
        #[arg(long)]
        fronts_only: bool,

        /// Do not detect backs shared by many cards
        #[arg(long)]
        no_common_back: bool,
    },

    /// Save or show the duplex offset applied to back pages
    Offset {
        /// Horizontal offset in pixels at 300 ppi
        #[arg(long, allow_hyphen_values = true, required_unless_present = "show")]
        x: Option<i32>,

        /// Vertical offset in pixels at 300 ppi
        #[arg(long, allow_hyphen_values = true, required_unless_present = "show")]
        y: Option<i32>,

        /// Print the saved offset
        #[arg(long, conflicts_with_all = ["x", "y"])]
        show: bool,

        /// Offset record location
        #[arg(long, default_value = card_sheet::constants::OFFSET_DATA_PATH)]
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CardArg {
    Standard,
    StandardDouble,
    Japanese,
    Poker,
    PokerHalf,
    Bridge,
    BridgeSquare,
    Tarot,
    Domino,
    DominoSquare,
}

#[derive(Clone, Copy, ValueEnum)]
enum PaperArg {
    Letter,
    Tabloid,
    A4,
    A3,
    Archb,
}

#[derive(Clone, Copy, ValueEnum)]
enum RegistrationArg {
    #[value(name = "3")]
    Three,
    #[value(name = "4")]
    Four,
}

impl From<CardArg> for CardSize {
    fn from(arg: CardArg) -> Self {
        match arg {
            CardArg::Standard => Self::Standard,
            CardArg::StandardDouble => Self::StandardDouble,
            CardArg::Japanese => Self::Japanese,
            CardArg::Poker => Self::Poker,
            CardArg::PokerHalf => Self::PokerHalf,
            CardArg::Bridge => Self::Bridge,
            CardArg::BridgeSquare => Self::BridgeSquare,
            CardArg::Tarot => Self::Tarot,
            CardArg::Domino => Self::Domino,
            CardArg::DominoSquare => Self::DominoSquare,
        }
    }
}

impl From<PaperArg> for PaperSize {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::Letter => Self::Letter,
            PaperArg::Tabloid => Self::Tabloid,
            PaperArg::A4 => Self::A4,
            PaperArg::A3 => Self::A3,
            PaperArg::Archb => Self::ArchB,
        }
    }
}

impl From<RegistrationArg> for Registration {
    fn from(arg: RegistrationArg) -> Self {
        match arg {
            RegistrationArg::Three => Self::Three,
            RegistrationArg::Four => Self::Four,
        }
    }
}

fn parse_pair(s: &str) -> std::result::Result<(u32, u32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{}'", s))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("'{}': {}", v, e))
    };
    Ok((parse(x)?, parse(y)?))
}

/// Asks on the terminal which back image to use
struct ConsoleSelector;

impl BackSelector for ConsoleSelector {
    fn choose(&mut self, candidates: &[PathBuf]) -> usize {
        println!("Several back images found:");
        for (i, candidate) in candidates.iter().enumerate() {
            println!("  {}: {}", i + 1, candidate.display());
        }

        let stdin = std::io::stdin();
        loop {
            print!("Choose a back [1-{}]: ", candidates.len());
            let _ = std::io::stdout().flush();

            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                // End of input: fall back to the first candidate
                Ok(0) | Err(_) => return 0,
                Ok(_) => {}
            }

            match line.trim().parse::<usize>() {
                Ok(n) if (1..=candidates.len()).contains(&n) => return n - 1,
                _ => println!("Please enter a number between 1 and {}", candidates.len()),
            }
        }
    }
}

async fn load_catalog(layouts: Option<&Path>) -> Result<LayoutCatalog> {
    let catalog = match layouts {
        Some(path) => {
            log::info!("Loading layouts from {}", path.display());
            LayoutCatalog::load(path)
                .await
                .with_context(|| format!("loading {}", path.display()))?
        }
        None => LayoutCatalog::builtin()?,
    };
    log::debug!(
        "{} supported paper/card combinations",
        catalog.supported_pairs().len()
    );
    Ok(catalog)
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Build {
            options,
            front,
            back,
            double_sided,
            output,
            images,
            card,
            paper,
            registration,
            fronts_only,
            crop,
            extend_corners,
            bleed,
            ppi,
            quality,
            skip,
            load_offset,
            name,
            layouts,
            assets,
            label_font,
        } => {
            let mut sheet = match &options {
                Some(path) => SheetOptions::load(path)
                    .await
                    .with_context(|| format!("loading {}", path.display()))?,
                None => SheetOptions::default(),
            };

            if let Some(dir) = front {
                sheet.front_dir = dir;
            }
            if let Some(dir) = back {
                sheet.back_dir = dir;
            }
            if let Some(dir) = double_sided {
                sheet.double_sided_dir = dir;
            }
            sheet.output = match (output, images) {
                (Some(path), true) => OutputTarget::Images(path),
                (Some(path), false) => OutputTarget::Pdf(path),
                (None, true) => OutputTarget::Images(PathBuf::from("game/output")),
                (None, false) => sheet.output,
            };
            if let Some(card) = card {
                sheet.card_size = card.into();
            }
            if let Some(paper) = paper {
                sheet.paper_size = paper.into();
            }
            if let Some(registration) = registration {
                sheet.registration = registration.into();
            }
            sheet.fronts_only |= fronts_only;
            if let Some(crop) = crop {
                sheet.crop = crop;
            }
            if let Some(extend_corners) = extend_corners {
                sheet.extend_corners = extend_corners;
            }
            if bleed.is_some() {
                sheet.bleed = bleed;
            }
            if let Some(ppi) = ppi {
                sheet.ppi = ppi;
            }
            if let Some(quality) = quality {
                sheet.quality = quality;
            }
            if !skip.is_empty() {
                sheet.skip_indices = skip;
            }
            sheet.load_offset |= load_offset;
            if name.is_some() {
                sheet.name = name;
            }
            if assets.is_some() {
                sheet.assets_dir = assets;
            }
            if label_font.is_some() {
                sheet.label_font = label_font;
            }

            log::debug!("Sheet options: {:?}", sheet);
            let catalog = load_catalog(layouts.as_deref()).await?;
            let report = card_sheet::build_sheets(&catalog, &sheet, &mut ConsoleSelector).await?;

            if report.outputs.is_empty() {
                println!("Nothing to do: no card images found");
                return Ok(());
            }
            println!(
                "Placed {} cards on {} sheet(s), {} page(s)",
                report.cards, report.sheets, report.pages
            );
            if report.default_back {
                println!("  Using the built-in card back");
            }
            if report.offset_applied {
                println!("  Duplex offset applied to back pages");
            }
            for output in &report.outputs {
                println!("  → {}", output.display());
            }
        }

        Commands::Extract {
            input,
            options,
            output_root,
            grid,
            short_edge_flip,
            min_dimension,
            skip_pages,
            fronts_only,
            no_common_back,
        } => {
            let mut extract = match &options {
                Some(path) => ExtractOptions::load(path)
                    .await
                    .with_context(|| format!("loading {}", path.display()))?,
                None => ExtractOptions::default(),
            };

            extract.input = input;
            if let Some(root) = output_root {
                extract.output_root = root;
            }
            if grid.is_some() {
                extract.grid = grid;
            }
            extract.short_edge_flip |= short_edge_flip;
            if let Some(min) = min_dimension {
                extract.min_dimension = min;
            }
            if skip_pages.is_some() {
                extract.skip_pages = skip_pages;
            }
            extract.fronts_only |= fronts_only;
            if no_common_back {
                extract.common_back = false;
            }

            log::debug!("Extract options: {:?}", extract);
            let output_root = extract.output_root.clone();
            let report = pnp_extract::extract(extract).await?;

            println!("Extraction summary:");
            println!("  Documents: {}", report.documents);
            println!("  Pages: {}", report.pages);
            println!("  Fronts: {}", report.fronts);
            println!("  Common backs: {}", report.common_backs);
            println!(
                "  Unique backs: {} ({} matched to a front)",
                report.unique_backs, report.paired_backs
            );
            if !report.diagnostics.is_empty() {
                println!("  Warnings: {}", report.diagnostics.len());
                for diagnostic in &report.diagnostics {
                    println!("    - {}", diagnostic);
                }
            }
            println!("  → {}", output_root.display());
        }

        Commands::Offset { x, y, show, path } => {
            if show {
                let offset = OffsetData::load(&path)
                    .await
                    .with_context(|| format!("no offset saved at {}", path.display()))?;
                println!(
                    "x offset: {}, y offset: {}",
                    offset.x_offset, offset.y_offset
                );
                return Ok(());
            }

            let (Some(x), Some(y)) = (x, y) else {
                bail!("both --x and --y are required");
            };
            OffsetData::new(x, y).save(&path).await?;
            println!("Saved offset x: {}, y: {} → {}", x, y, path.display());
        }
    }

    Ok(())
}
