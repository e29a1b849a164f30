//! Sheet assembler
//!
//! Turns three image directories into an ordered sequence of front and back
//! pages. All checks that can fail without decoding artwork happen in
//! [`SheetPlan::prepare`]; rendering then runs page by page in order.

pub mod io;

use crate::artwork::{default_back, registration_canvas};
use crate::catalog::{CardLayout, CardLayoutSize, LayoutCatalog};
use crate::compositor::{CompositeSettings, draw_card_layout};
use crate::constants::ppi_ratio;
use crate::crop::{max_bleed, parse_crop};
use crate::images::{BackSelector, ImageIndex, check_paths_subset, load_image, stem_key};
use crate::offset::{OffsetData, offset_pages};
use crate::options::{OutputTarget, SheetOptions};
use crate::types::*;
use image::DynamicImage;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// One card to place: its front and, for double-sided cards, its own back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardEntry {
    pub front: PathBuf,
    pub back: Option<PathBuf>,
}

/// Where back cells get their artwork
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackArt {
    /// Fronts-only job, no back pages
    None,
    /// One image shared by every single-sided card
    Shared(PathBuf),
    /// The built-in procedural back
    Default,
}

/// A validated render job
#[derive(Debug, Clone)]
pub struct SheetPlan {
    options: SheetOptions,
    card: CardLayoutSize,
    paper_width: u32,
    paper_height: u32,
    layout: CardLayout,
    crop: (f64, f64),
    bleed: (u32, u32),
    skip: BTreeSet<usize>,
    cards: Vec<CardEntry>,
    back: BackArt,
}

/// Pages produced by a render pass
struct Rendered {
    pages: Vec<SheetPage>,
    cards: usize,
    offset_applied: bool,
}

impl SheetPlan {
    /// Run every pre-flight check and resolve the job's inputs.
    ///
    /// `selector` is consulted only when the back directory holds more than
    /// one image.
    pub fn prepare(
        catalog: &LayoutCatalog,
        options: &SheetOptions,
        selector: &mut dyn BackSelector,
    ) -> Result<Self> {
        options.validate()?;

        let resolved = catalog.resolve(options.card_size, options.paper_size)?;
        let card = resolved.card;
        let layout = resolved.layout.clone();

        let crop = parse_crop(&options.crop, card.width, card.height)?;
        if crop.0 >= 100.0 || crop.1 >= 100.0 {
            return Err(SheetError::Config(format!(
                "Crop '{}' removes the whole card ({:.1}% x {:.1}%)",
                options.crop, crop.0, crop.1
            )));
        }

        let fronts = ImageIndex::scan(&options.front_dir, true)?;
        let backs = ImageIndex::scan(&options.back_dir, false)?;
        let double_sided = ImageIndex::scan(&options.double_sided_dir, true)?;

        let missing = check_paths_subset(
            double_sided.files().iter().map(String::as_str),
            fronts.files().iter().map(String::as_str),
        );
        if !missing.is_empty() {
            return Err(SheetError::Input(format!(
                "Double-sided backs {:?} do not have matching fronts. Add the missing fronts to front image directory \"{}\"",
                missing,
                options.front_dir.display()
            )));
        }

        if options.fronts_only && !double_sided.is_empty() {
            return Err(SheetError::Input(format!(
                "Cannot render fronts only with double-sided cards. Remove cards from double-sided image directory \"{}\"",
                options.double_sided_dir.display()
            )));
        }

        let skip = valid_skip_indices(&options.skip_indices, layout.capacity())?;

        let back = if options.fronts_only {
            BackArt::None
        } else {
            select_back(&backs, selector)?
        };

        let cards = order_cards(&fronts, &double_sided)?;

        let limit = max_bleed(&layout.x_pos, &layout.y_pos, card.width, card.height);
        let bleed = match options.bleed {
            Some((x, y)) => (x.min(limit.0), y.min(limit.1)),
            None => limit,
        };
        log::debug!(
            "Layout {}: {}x{} cells, bleed {:?}, crop {:?}",
            layout.template,
            layout.num_cols(),
            layout.num_rows(),
            bleed,
            crop
        );

        Ok(Self {
            options: options.clone(),
            card,
            paper_width: resolved.paper.width,
            paper_height: resolved.paper.height,
            layout,
            crop,
            bleed,
            skip,
            cards,
            back,
        })
    }

    /// Cards in render order
    pub fn cards(&self) -> &[CardEntry] {
        &self.cards
    }

    pub fn back(&self) -> &BackArt {
        &self.back
    }

    /// Synthetic bleed used for every cell (baseline px)
    pub fn bleed(&self) -> (u32, u32) {
        self.bleed
    }

    /// Cards placed on each page once skipped cells are removed
    pub fn cards_per_page(&self) -> usize {
        self.layout.capacity() - self.skip.len()
    }

    /// Render every page in order, applying the saved offset if requested
    pub fn render(&self) -> Result<Vec<SheetPage>> {
        Ok(self.render_pages()?.pages)
    }

    fn render_pages(&self) -> Result<Rendered> {
        let ratio = ppi_ratio(self.options.ppi);
        let canvas = registration_canvas(
            self.options.assets_dir.as_deref(),
            self.options.paper_size,
            self.options.registration,
            self.paper_width,
            self.paper_height,
            ratio,
        )?;

        let settings = CompositeSettings {
            bleed: self.bleed,
            crop: self.crop,
            ratio,
            extend_corners: self.options.extend_corners,
        };

        let shared_back = match &self.back {
            BackArt::None => None,
            BackArt::Shared(path) => Some(load_image(path)?),
            BackArt::Default => Some(DynamicImage::ImageRgba8(default_back(
                self.card.width,
                self.card.height,
            ))),
        };

        let capacity = self.layout.capacity();
        let mut pages = Vec::new();
        let mut image_number = 1;

        for (sheet_index, batch) in self.cards.chunks(self.cards_per_page()).enumerate() {
            let mut fronts: Vec<Option<DynamicImage>> = Vec::with_capacity(capacity);
            let mut own_backs: Vec<Option<DynamicImage>> = Vec::with_capacity(capacity);
            let mut entries = batch.iter();

            for cell in 0..capacity {
                let entry = if self.skip.contains(&cell) {
                    None
                } else {
                    entries.next()
                };
                let Some(entry) = entry else {
                    fronts.push(None);
                    own_backs.push(None);
                    continue;
                };

                log::info!("Image {}: {}", image_number, entry.front.display());
                image_number += 1;

                fronts.push(Some(load_image(&entry.front)?));
                own_backs.push(match (&self.back, &entry.back) {
                    (BackArt::None, _) | (_, None) => None,
                    (_, Some(path)) => Some(load_image(path)?),
                });
            }

            let mut front_page = canvas.clone();
            let front_refs: Vec<Option<&DynamicImage>> = fronts.iter().map(Option::as_ref).collect();
            draw_card_layout(
                &mut front_page,
                &front_refs,
                &self.layout,
                self.card,
                &settings,
                SheetSide::Front,
            );

            pages.push(SheetPage {
                side: SheetSide::Front,
                image: front_page,
                label: Some(self.label(sheet_index + 1)),
            });

            if self.options.fronts_only {
                continue;
            }

            let back_refs: Vec<Option<&DynamicImage>> = fronts
                .iter()
                .zip(&own_backs)
                .map(|(front, own)| match front {
                    Some(_) => own.as_ref().or(shared_back.as_ref()),
                    None => None,
                })
                .collect();

            let mut back_page = canvas.clone();
            draw_card_layout(
                &mut back_page,
                &back_refs,
                &self.layout,
                self.card,
                &settings,
                SheetSide::Back,
            );

            pages.push(SheetPage {
                side: SheetSide::Back,
                image: back_page,
                label: None,
            });
        }

        let offset_applied = !pages.is_empty() && self.apply_offset(&mut pages);

        Ok(Rendered {
            pages,
            cards: self.cards.len(),
            offset_applied,
        })
    }

    fn apply_offset(&self, pages: &mut [SheetPage]) -> bool {
        if !self.options.load_offset {
            return false;
        }

        let offset = match OffsetData::load_blocking(&self.options.offset_path) {
            Ok(offset) => offset,
            Err(e) => {
                log::warn!(
                    "Offset cannot be applied, cannot read \"{}\": {}",
                    self.options.offset_path.display(),
                    e
                );
                return false;
            }
        };

        if self.options.fronts_only {
            log::warn!("Offset cannot be applied, a fronts-only job has no back pages");
            return false;
        }

        log::info!(
            "Loaded x offset: {}, y offset: {}",
            offset.x_offset,
            offset.y_offset
        );
        offset_pages(pages, offset, self.options.ppi) > 0
    }

    /// `sheet: <n>, template: <t>`, prefixed with the deck name when set
    fn label(&self, sheet: usize) -> String {
        let label = format!("sheet: {}, template: {}", sheet, self.layout.template);
        match &self.options.name {
            Some(name) => format!("name: {}, {}", name, label),
            None => label,
        }
    }

    /// Render and write every page
    pub fn execute(&self) -> Result<SheetReport> {
        let rendered = self.render_pages()?;

        let mut report = SheetReport {
            cards: rendered.cards,
            sheets: rendered
                .pages
                .iter()
                .filter(|p| p.side == SheetSide::Front)
                .count(),
            pages: rendered.pages.len(),
            default_back: self.back == BackArt::Default,
            offset_applied: rendered.offset_applied,
            outputs: Vec::new(),
        };

        if rendered.pages.is_empty() {
            log::warn!("No pages were generated");
            return Ok(report);
        }

        match &self.options.output {
            OutputTarget::Pdf(path) => {
                io::write_pdf(&rendered.pages, path, self.options.ppi, self.options.quality)?;
                log::info!("Generated PDF: {}", path.display());
                report.outputs.push(path.clone());
            }
            OutputTarget::Images(path) => {
                let dir = io::image_output_dir(path);
                let font = match &self.options.label_font {
                    Some(font_path) => io::load_label_font(font_path)?,
                    None => io::default_label_font()?,
                };
                report.outputs =
                    io::write_images(&rendered.pages, &dir, self.options.ppi, &font)?;
                log::info!("Generated images: {}", dir.display());
            }
        }

        Ok(report)
    }
}

/// Render a deck into print sheets.
///
/// Directory scanning and back selection happen on the calling task; decoding,
/// compositing and writing run on a blocking thread.
pub async fn build_sheets(
    catalog: &LayoutCatalog,
    options: &SheetOptions,
    selector: &mut dyn BackSelector,
) -> Result<SheetReport> {
    let plan = SheetPlan::prepare(catalog, options, selector)?;
    tokio::task::spawn_blocking(move || plan.execute()).await?
}

/// Synchronous variant of [`build_sheets`]
pub fn build_sheets_blocking(
    catalog: &LayoutCatalog,
    options: &SheetOptions,
    selector: &mut dyn BackSelector,
) -> Result<SheetReport> {
    SheetPlan::prepare(catalog, options, selector)?.execute()
}

/// Drop out-of-range skip indices with a warning and reject skipping every cell
fn valid_skip_indices(requested: &[usize], capacity: usize) -> Result<BTreeSet<usize>> {
    let (valid, ignored): (Vec<usize>, Vec<usize>) =
        requested.iter().copied().partition(|&index| index < capacity);

    if !ignored.is_empty() {
        log::warn!(
            "Ignoring skip indices that are outside range 0-{}: {:?}",
            capacity.saturating_sub(1),
            ignored
        );
    }

    let valid: BTreeSet<usize> = valid.into_iter().collect();
    if valid.len() >= capacity {
        return Err(SheetError::Input(
            "You cannot skip all cards per page".to_string(),
        ));
    }

    Ok(valid)
}

/// Pick the shared back image from the back directory
fn select_back(backs: &ImageIndex, selector: &mut dyn BackSelector) -> Result<BackArt> {
    match backs.files() {
        [] => {
            log::info!(
                "No back image provided in back image directory \"{}\". Using default instead.",
                backs.root().display()
            );
            Ok(BackArt::Default)
        }
        [single] => Ok(BackArt::Shared(backs.path_of(single))),
        many => {
            let candidates: Vec<PathBuf> = many.iter().map(|f| backs.path_of(f)).collect();
            let choice = selector.choose(&candidates);
            candidates
                .get(choice)
                .cloned()
                .map(BackArt::Shared)
                .ok_or_else(|| {
                    SheetError::Config(format!(
                        "Back image choice {} is out of range, {} candidates",
                        choice,
                        candidates.len()
                    ))
                })
        }
    }
}

/// Single-sided fronts first, then fronts with a double-sided back. Both
/// groups keep the natural order of the front directory.
fn order_cards(fronts: &ImageIndex, double_sided: &ImageIndex) -> Result<Vec<CardEntry>> {
    let mut single = Vec::new();
    let mut paired = Vec::new();

    for file in fronts.files() {
        let key = stem_key(file);
        let front = fronts.path_of(file);
        if double_sided.contains_key(&key) {
            let back = double_sided.resolve_key(&key)?;
            paired.push(CardEntry { front, back });
        } else {
            single.push(CardEntry { front, back: None });
        }
    }

    single.extend(paired);
    Ok(single)
}
