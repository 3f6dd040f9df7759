use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use eyre::{Context, OptionExt, Result, bail};
use itertools::Itertools;
use kitprefs::persist::PrefsFile;
use kitprefs::{InterpolateFn, Preferences};
use kitpuzzle_core::{PuzzleCatalog, PuzzleSpec, StepNumber};
use kitpuzzle_view::{AssemblySession, RenderedPiece, SessionSummary, StepAction, Viewport};
use kitstore::{
    CanvasPosition, CartItem, CartStore, Currency, Design, FileStorage, Product, Rgb,
    format_price,
};
use serde::Serialize;
use web_time::Instant;

/// Kitshop command-line interface
#[derive(Debug, clap::Parser)]
#[command(version)]
pub(crate) struct Args {
    /// Additional puzzle definition (JSON or YAML) to load, use '-' for stdin.
    #[arg(long, value_parser)]
    pub puzzle_file: Option<clio::Input>,

    /// Currency to display prices in, overriding preferences.
    #[arg(long)]
    pub currency: Option<Currency>,

    #[command(subcommand)]
    pub subcommand: Subcommand,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Subcommand {
    /// Print the product catalog as JSON.
    Products,
    /// Print all puzzle IDs.
    Puzzles,
    /// Print the steps of a puzzle as JSON.
    Steps {
        /// Puzzle ID (such as `house`)
        puzzle: String,
    },
    /// Apply step actions to a fresh puzzle and print the final state as JSON.
    Assemble {
        /// Puzzle ID (such as `house`)
        puzzle: String,
        /// Actions: `next`, `back`, `reset`, `all`, `redo`, or `jump:N`
        actions: Vec<StepAction>,

        /// Width of the preview viewport in logical pixels.
        #[arg(long, default_value_t = 1280.0, value_parser = parse_pixels)]
        viewport_width: f32,
        /// Height of the preview viewport in logical pixels.
        #[arg(long, default_value_t = 720.0, value_parser = parse_pixels)]
        viewport_height: f32,
        /// Seconds after the last action at which to render the preview.
        #[arg(long, default_value_t = 0.0, value_parser = parse_seconds)]
        elapsed: f32,
    },
    /// Inspect or modify the shopping cart.
    Cart {
        #[command(subcommand)]
        command: CartCommand,
    },
    /// Inspect or modify preferences.
    Prefs {
        #[command(subcommand)]
        command: PrefsCommand,
    },
    /// Print the paths where preferences and storage are kept as JSON.
    Paths,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum PrefsCommand {
    /// Print the current preferences as JSON.
    Show,
    /// Change preferences and save them to the preferences file.
    Set {
        /// Currency to display prices in.
        #[arg(long)]
        currency: Option<Currency>,
        /// Duration of the piece entry animation, in seconds.
        #[arg(long, value_parser = parse_seconds)]
        piece_entry_duration: Option<f32>,
        /// Easing of the piece entry animation (such as `ease_out_cubic`).
        #[arg(long)]
        piece_entry_interpolation: Option<InterpolateFn>,
        /// Viewport width below which the preview uses the mobile layout.
        #[arg(long, value_parser = parse_pixels)]
        mobile_breakpoint: Option<f32>,
    },
}

/// Longest time span accepted on the command line, in seconds.
const MAX_SECONDS: f32 = 24.0 * 60.0 * 60.0;

fn parse_seconds(s: &str) -> Result<f32, String> {
    let secs: f32 = s.parse().map_err(|e: std::num::ParseFloatError| e.to_string())?;
    if (0.0..=MAX_SECONDS).contains(&secs) {
        Ok(secs)
    } else {
        Err(format!("expected a number of seconds from 0 to {MAX_SECONDS}"))
    }
}

fn parse_pixels(s: &str) -> Result<f32, String> {
    let px: f32 = s.parse().map_err(|e: std::num::ParseFloatError| e.to_string())?;
    if px.is_finite() && px >= 0.0 {
        Ok(px)
    } else {
        Err("expected a non-negative number of pixels".to_owned())
    }
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum CartCommand {
    /// Print the cart contents as JSON.
    List,
    /// Add a product to the cart.
    Add {
        /// Product ID (such as `mug`)
        product: String,
        /// Number of copies.
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
        #[command(flatten)]
        design: DesignArgs,
    },
    /// Remove an item from the cart.
    Remove {
        /// Cart item ID
        id: u64,
    },
    /// Change the quantity of an item. A quantity of 0 removes it.
    Quantity {
        /// Cart item ID
        id: u64,
        /// New quantity.
        quantity: u32,
    },
    /// Remove every item from the cart.
    Clear,
}

/// Customization applied to a product when adding it to the cart.
#[derive(clap::Args, Debug, Clone)]
pub(crate) struct DesignArgs {
    /// Line of text to print, centered on the canvas.
    #[arg(long)]
    pub text: Option<String>,
    /// Font for `--text`.
    #[arg(long, default_value = "sans-serif")]
    pub font: String,
    /// Font size for `--text`, in canvas pixels.
    #[arg(long, default_value_t = 48.0)]
    pub font_size: f32,
    /// Color for `--text` (such as `#336699`).
    #[arg(long, default_value = "#000000")]
    pub color: Rgb,
    /// Logo image to print, centered on the canvas.
    #[arg(long)]
    pub logo: Option<String>,
    /// Scale factor for `--logo`.
    #[arg(long, default_value_t = 1.0)]
    pub logo_scale: f32,
    /// Product texture (such as `kraft`).
    #[arg(long)]
    pub texture: Option<String>,
    /// Background color (such as `#ffeedd`).
    #[arg(long)]
    pub background: Option<Rgb>,
}
impl Default for DesignArgs {
    fn default() -> Self {
        Self {
            text: None,
            font: "sans-serif".to_owned(),
            font_size: 48.0,
            color: Rgb::BLACK,
            logo: None,
            logo_scale: 1.0,
            texture: None,
            background: None,
        }
    }
}
impl DesignArgs {
    /// Builds a design for `product`.
    pub fn build(&self, product: &Product) -> Result<Design> {
        let mut design = Design::new(product);
        let center = CanvasPosition {
            x: product.canvas.width as f32 / 2.0,
            y: product.canvas.height as f32 / 2.0,
        };
        if let Some(color) = self.background {
            design.set_background_color(color);
        }
        if let Some(texture) = &self.texture {
            design.set_texture(product, texture.as_str())?;
        }
        if let Some(logo) = &self.logo {
            design.add_logo(logo.as_str(), center, self.logo_scale)?;
        }
        if let Some(text) = &self.text {
            design.add_text(
                text.as_str(),
                self.font.as_str(),
                self.font_size,
                self.color,
                center,
            )?;
        }
        Ok(design)
    }
}

pub(crate) fn exec(args: Args) -> Result<()> {
    let Args {
        puzzle_file,
        currency,
        subcommand,
    } = args;

    let prefs = Preferences::load(None);
    let currency = currency.unwrap_or(prefs.store.currency);
    let catalog = load_catalog(puzzle_file)?;

    match subcommand {
        Subcommand::Products => {
            let products = kitstore::PRODUCT_CATALOG
                .iter()
                .map(|product| ProductInfo::new(product, currency))
                .collect_vec();
            write_json_output(&products)
        }

        Subcommand::Puzzles => {
            for puzzle in catalog.iter() {
                println!("{}", puzzle.id);
            }
            Ok(())
        }

        Subcommand::Steps { puzzle } => {
            let spec = get_puzzle(&catalog, &puzzle)?;
            write_json_output(&StepInfo::list(&spec))
        }

        Subcommand::Assemble {
            puzzle,
            actions,
            viewport_width,
            viewport_height,
            elapsed,
        } => {
            let spec = get_puzzle(&catalog, &puzzle)?;
            let viewport = Viewport::new(viewport_width, viewport_height);
            let report = assemble(spec, &actions, &prefs, viewport, elapsed)?;
            write_json_output(&report)
        }

        Subcommand::Cart { command } => {
            let cart = CartStore::open(Box::new(FileStorage::user()?));
            exec_cart(&cart, command, currency)
        }

        Subcommand::Prefs { command } => exec_prefs(prefs, &PrefsFile::user()?, command),

        Subcommand::Paths => write_json_output(&PathsInfo {
            prefs_file: kitpaths::prefs_file()?.display().to_string(),
            storage_dir: kitpaths::storage_dir()?.display().to_string(),
            cart_file: kitpaths::storage_file(kitstore::CART_STORAGE_KEY)?
                .display()
                .to_string(),
        }),
    }
}

fn exec_cart(cart: &CartStore, command: CartCommand, currency: Currency) -> Result<()> {
    match command {
        CartCommand::List => {}
        CartCommand::Add {
            product,
            quantity,
            design,
        } => {
            let product = kitstore::product_by_id(&product)
                .ok_or_else(|| eyre::eyre!("no product with ID {product:?}"))?;
            let design = design.build(product).wrap_err("invalid design")?;
            let id = cart.add(product, design, quantity)?;
            log::info!("added {quantity}x {} as cart item {id}", product.id);
        }
        CartCommand::Remove { id } => {
            if !cart.remove(id) {
                bail!("no cart item with ID {id}");
            }
        }
        CartCommand::Quantity { id, quantity } => cart.set_quantity(id, quantity)?,
        CartCommand::Clear => cart.clear(),
    }
    write_json_output(&CartInfo::new(cart, currency))
}

fn exec_prefs(mut prefs: Preferences, file: &PrefsFile, command: PrefsCommand) -> Result<()> {
    match command {
        PrefsCommand::Show => {}
        PrefsCommand::Set {
            currency,
            piece_entry_duration,
            piece_entry_interpolation,
            mobile_breakpoint,
        } => {
            if let Some(currency) = currency {
                prefs.store.currency = currency;
                prefs.needs_save = true;
            }
            if let Some(duration) = piece_entry_duration {
                prefs.animation.piece_entry_duration = duration;
                prefs.needs_save = true;
            }
            if let Some(interpolation) = piece_entry_interpolation {
                prefs.animation.piece_entry_interpolation = interpolation;
                prefs.needs_save = true;
            }
            if let Some(breakpoint) = mobile_breakpoint {
                prefs.viewport.mobile_breakpoint = breakpoint;
                prefs.needs_save = true;
            }
            if prefs.needs_save {
                prefs.save_to(file).wrap_err("error saving preferences")?;
            } else {
                log::warn!("no preferences given; nothing to save");
            }
        }
    }
    write_json_output(&PrefsInfo::new(&prefs))
}

/// Returns the built-in puzzles plus the one in `puzzle_file`, if any.
fn load_catalog(puzzle_file: Option<clio::Input>) -> Result<PuzzleCatalog> {
    let mut catalog = PuzzleCatalog::with_builtins();
    if let Some(mut input) = puzzle_file {
        let mut buffer = String::new();
        input
            .read_to_string(&mut buffer)
            .context("error reading puzzle file")?;
        let spec = parse_puzzle(&buffer)?;
        catalog
            .add(spec)
            .wrap_err_with(|| format!("invalid puzzle in {:?}", input.path()))?;
    }
    Ok(catalog)
}

/// Parses a puzzle definition from JSON or YAML.
fn parse_puzzle(s: &str) -> Result<PuzzleSpec> {
    if s.trim_start().starts_with('{') {
        serde_json::from_str(s).context("error parsing puzzle JSON")
    } else {
        serde_norway::from_str(s).context("error parsing puzzle YAML")
    }
}

fn get_puzzle(catalog: &PuzzleCatalog, id: &str) -> Result<Arc<PuzzleSpec>> {
    catalog.get(id).ok_or_eyre(format!(
        "no puzzle with ID {id:?}; available puzzles: {}",
        catalog.iter().map(|p| &p.id).join(", "),
    ))
}

/// Runs `actions` on a fresh session and renders the preview `elapsed`
/// seconds after the last one.
fn assemble(
    spec: Arc<PuzzleSpec>,
    actions: &[StepAction],
    prefs: &Preferences,
    viewport: Viewport,
    elapsed: f32,
) -> Result<AssemblyReport> {
    let offset = Duration::try_from_secs_f32(elapsed)
        .wrap_err_with(|| format!("invalid preview time {elapsed}"))?;
    let now = Instant::now();
    let frame_time = now
        .checked_add(offset)
        .ok_or_eyre("preview time is out of range")?;
    let mut session = AssemblySession::new(spec, prefs, viewport, now);
    for &action in actions {
        let outcome = session.apply(action, now);
        log::debug!("{action} -> {outcome:?}");
    }
    Ok(AssemblyReport {
        state: session.summary(),
        device: session.preview().device(),
        needs_redraw: session.needs_redraw(frame_time),
        frame: session.frame(frame_time),
    })
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AssemblyReport {
    #[serde(flatten)]
    state: SessionSummary,
    device: kitprefs::DeviceClass,
    needs_redraw: bool,
    frame: Vec<RenderedPiece>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ProductInfo {
    #[serde(flatten)]
    product: Product,
    formatted_price: String,
}
impl ProductInfo {
    fn new(product: &Product, currency: Currency) -> Self {
        Self {
            product: product.clone(),
            formatted_price: format_price(product.price, currency),
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct StepInfo {
    step: StepNumber,
    description: String,
    pieces: Vec<String>,
}
impl StepInfo {
    fn list(spec: &PuzzleSpec) -> Vec<Self> {
        spec.steps
            .iter()
            .map(|step| StepInfo {
                step: step.step_number,
                description: step.description.clone(),
                pieces: spec
                    .pieces_in_step(step.step_number)
                    .into_iter()
                    .map(|p| p.part_name)
                    .collect(),
            })
            .collect()
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CartInfo {
    items: Vec<CartItem>,
    item_count: u32,
    total: i64,
    formatted_total: String,
}
impl CartInfo {
    fn new(cart: &CartStore, currency: Currency) -> Self {
        let total = cart.total();
        Self {
            items: cart.items(),
            item_count: cart.item_count(),
            total,
            formatted_total: format_price(total, currency),
        }
    }
}

#[derive(Serialize, Debug)]
struct PrefsInfo<'a> {
    animation: &'a kitprefs::AnimationPreferences,
    viewport: &'a kitprefs::ViewportPreferences,
    store: &'a kitprefs::StorePreferences,
}
impl<'a> PrefsInfo<'a> {
    fn new(prefs: &'a Preferences) -> Self {
        Self {
            animation: &prefs.animation,
            viewport: &prefs.viewport,
            store: &prefs.store,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PathsInfo {
    prefs_file: String,
    storage_dir: String,
    cart_file: String,
}

fn write_json_output<T: Serialize>(value: &T) -> Result<()> {
    serde_json::to_writer_pretty(std::io::stdout(), value)
        .context("error serializing data and writing to stdout")?;
    println!();
    Ok(())
}
