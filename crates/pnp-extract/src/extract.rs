//! Extraction pipeline: documents in, card image files out

use crate::classify::CommonBackIndex;
use crate::constants::*;
use crate::folder::{PdfGroup, find_pdf_pairs};
use crate::grid::{detect_grid_size, order_placements};
use crate::options::{ExtractOptions, GridOverride, parse_skip_pages};
use crate::pairing::PairingTable;
use crate::pdf::{ExtractedImage, PdfSource, Placement};
use crate::report::{Diagnostic, ExtractionReport};
use crate::types::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Extract card images from a PDF or a folder of PDFs
pub async fn extract(options: ExtractOptions) -> Result<ExtractionReport> {
    options.validate()?;
    if tokio::fs::metadata(&options.input).await.is_err() {
        return Err(ExtractError::NotFound(options.input.clone()));
    }

    tokio::task::spawn_blocking(move || extract_blocking(&options)).await?
}

/// Blocking form of [`extract`]
pub fn extract_blocking(options: &ExtractOptions) -> Result<ExtractionReport> {
    options.validate()?;

    let mut extractor = Extractor::new(options);

    if options.input.is_dir() {
        extractor.run_folder(&options.input)?;
    } else {
        let mode = if options.fronts_only {
            DocumentMode::FrontsOnly
        } else {
            DocumentMode::Alternating
        };
        extractor.run_document(&options.input, mode, None, Path::new(""), None)?;
    }

    log::info!("Extraction complete: {}", extractor.report);
    Ok(extractor.report)
}

/// Card placements of one page, filtered and in reading order
fn card_placements(
    source: &PdfSource,
    page: u32,
    min_dimension: u32,
    header_fraction: f64,
) -> Result<Vec<Placement>> {
    let header_band = source.page_height(page) * header_fraction;
    let cards = source
        .placements(page)?
        .into_iter()
        .filter(|p| p.pixel_width >= min_dimension && p.pixel_height >= min_dimension)
        .filter(|p| p.y >= header_band)
        .collect();
    Ok(order_placements(cards, ROW_TOLERANCE))
}

fn card_name(prefix: Option<&str>, page: u32, position: usize) -> String {
    match prefix {
        Some(prefix) => format!("{}_{}_{}", prefix, page, position),
        None => format!("{}_{}", page, position),
    }
}

/// Name of a back whose front page holds a different number of cards
fn unpaired_back_name(prefix: Option<&str>, page: u32, position: usize) -> String {
    match prefix {
        Some(prefix) => format!("{}_back_{}_{}", prefix, page, position),
        None => format!("back_{}_{}", page, position),
    }
}

fn write_card(dir: &Path, name: &str, image: &ExtractedImage) -> Result<PathBuf> {
    let path = dir.join(format!("{}.{}", name, image.ext));
    std::fs::create_dir_all(dir)
        .and_then(|_| std::fs::write(&path, &image.bytes))
        .map_err(|source| ExtractError::Write {
            path: path.clone(),
            source,
        })?;
    log::debug!("Saved {}", path.display());
    Ok(path)
}

struct Extractor<'a> {
    options: &'a ExtractOptions,
    grid: Option<GridOverride>,
    skip: BTreeSet<u32>,
    report: ExtractionReport,
}

/// Output folders of one document
struct OutputDirs {
    front: PathBuf,
    back: PathBuf,
    double_sided: PathBuf,
}

impl OutputDirs {
    fn new(root: &Path, subdir: &Path) -> Self {
        Self {
            front: root.join(FRONT_DIR).join(subdir),
            back: root.join(BACK_DIR).join(subdir),
            double_sided: root.join(DOUBLE_SIDED_DIR).join(subdir),
        }
    }
}

impl<'a> Extractor<'a> {
    fn new(options: &'a ExtractOptions) -> Self {
        let mut report = ExtractionReport::default();

        let grid = match options.grid.as_deref() {
            Some(grid) => match grid.parse::<GridOverride>() {
                Ok(grid) => Some(grid),
                Err(_) => {
                    report.warn(Diagnostic::InvalidGrid(grid.to_string()));
                    None
                }
            },
            None => None,
        };

        let skip = match options.skip_pages.as_deref() {
            Some(list) => {
                let (pages, invalid) = parse_skip_pages(list);
                for part in invalid {
                    report.warn(Diagnostic::InvalidSkip(part));
                }
                pages
            }
            None => BTreeSet::new(),
        };

        Self {
            options,
            grid,
            skip,
            report,
        }
    }

    fn run_folder(&mut self, folder: &Path) -> Result<()> {
        let groups = find_pdf_pairs(folder)?;
        if groups.is_empty() {
            log::warn!("No PDF files found in {}", folder.display());
        }

        for (key, group) in groups {
            log::info!("Processing {}", key);
            self.run_group(&group)?;
        }
        Ok(())
    }

    fn run_group(&mut self, group: &PdfGroup) -> Result<()> {
        let prefix = Some(group.prefix.as_str());
        let subdir = group.subdir.as_path();

        let mut front_counts = None;
        if let Some(front) = &group.front {
            let counts =
                self.run_document(front, DocumentMode::FrontsOnly, prefix, subdir, None)?;
            front_counts = Some(counts);
        }

        if let Some(back) = &group.back {
            match (group.front.is_some(), self.options.fronts_only) {
                (true, true) => log::info!("Fronts only, ignoring {}", back.display()),
                (false, true) => {
                    self.run_document(back, DocumentMode::FrontsOnly, prefix, subdir, None)?;
                }
                (_, false) => {
                    self.run_document(
                        back,
                        DocumentMode::BacksOnly,
                        prefix,
                        subdir,
                        front_counts.as_deref(),
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Extract one document and return the card count of every page
    /// (`None` for skipped pages).
    ///
    /// `front_counts` holds the page counts of the front document paired with
    /// a `BacksOnly` document; page N of the back is matched against page N
    /// of the front.
    fn run_document(
        &mut self,
        path: &Path,
        mode: DocumentMode,
        prefix: Option<&str>,
        subdir: &Path,
        front_counts: Option<&[Option<usize>]>,
    ) -> Result<Vec<Option<usize>>> {
        let source = PdfSource::open(path)?;
        log::info!(
            "Extracting {} ({} pages)",
            path.display(),
            source.page_count()
        );
        self.report.documents += 1;

        let dirs = OutputDirs::new(&self.options.output_root, subdir);

        // Placements are needed by both prescans and the main pass
        let mut pages: Vec<Option<Vec<Placement>>> = Vec::new();
        for page in 1..=source.page_count() {
            if self.skip.contains(&page) {
                pages.push(None);
            } else {
                pages.push(Some(card_placements(
                    &source,
                    page,
                    self.options.min_dimension,
                    self.options.header_fraction,
                )?));
            }
        }
        let cards_on = |page: u32| pages.get(page as usize - 1).and_then(Option::as_ref);
        let fronts_paired_with = |page: u32| {
            front_counts.and_then(|counts| counts.get(page as usize - 1).copied().flatten())
        };

        let mut common = CommonBackIndex::new();
        if self.options.common_back {
            for page in 1..=source.page_count() {
                if mode.role_of(page) == PageRole::Back {
                    for placement in cards_on(page).into_iter().flatten() {
                        common.record(placement.image);
                    }
                }
            }
            let found = common.finalize(self.options.common_back_threshold);
            if found > 0 {
                log::info!("Found {} common back image(s)", found);
            }
        }

        let mut pairing = PairingTable::new();
        if mode == DocumentMode::Alternating {
            for front_page in (1..source.page_count()).step_by(2) {
                let (Some(fronts), Some(backs)) = (cards_on(front_page), cards_on(front_page + 1))
                else {
                    continue;
                };
                if fronts.len() != backs.len() && !backs.is_empty() {
                    pairing.mark_mismatched(front_page);
                    self.report.warn(Diagnostic::LayoutMismatch {
                        document: path.to_path_buf(),
                        front_page,
                        back_page: front_page + 1,
                        fronts: fronts.len(),
                        backs: backs.len(),
                    });
                }
            }
        }

        // Back pages of a paired document that cannot take their fronts' names
        let mut mismatched_backs = BTreeSet::new();
        if mode == DocumentMode::BacksOnly {
            for page in 1..=source.page_count() {
                let (Some(fronts), Some(backs)) = (fronts_paired_with(page), cards_on(page)) else {
                    continue;
                };
                if fronts != backs.len() && !backs.is_empty() {
                    mismatched_backs.insert(page);
                    self.report.warn(Diagnostic::LayoutMismatch {
                        document: path.to_path_buf(),
                        front_page: page,
                        back_page: page,
                        fronts,
                        backs: backs.len(),
                    });
                }
            }
        }

        for page in 1..=source.page_count() {
            let Some(cards) = cards_on(page) else {
                log::info!("Page {}: Skipped", page);
                continue;
            };
            self.report.pages += 1;

            if cards.is_empty() {
                self.report.warn(Diagnostic::EmptyPage {
                    document: path.to_path_buf(),
                    page,
                });
                continue;
            }

            match self.grid {
                Some(grid) if cards.len() > grid.capacity() => {
                    self.report.warn(Diagnostic::GridOverflow {
                        document: path.to_path_buf(),
                        page,
                        found: cards.len(),
                        capacity: grid.capacity(),
                    });
                }
                Some(_) => {}
                None => {
                    let (cols, rows) = detect_grid_size(cards, GRID_ROW_TOLERANCE);
                    log::info!(
                        "Page {}: Detected {}x{} grid ({} cards)",
                        page,
                        cols,
                        rows,
                        cards.len()
                    );
                }
            }

            let role = mode.role_of(page);
            let mut ordered: Vec<&Placement> = cards.iter().collect();
            // Separate back documents are already laid out in front order
            if mode == DocumentMode::Alternating
                && role == PageRole::Back
                && self.options.short_edge_flip
            {
                ordered.reverse();
            }

            for (index, placement) in ordered.into_iter().enumerate() {
                let position = index + 1;
                let name = card_name(prefix, page, position);

                // Common backs already written need no data at all
                if role == PageRole::Back
                    && common.is_common(placement.image)
                    && common.saved_name(placement.image).is_some()
                {
                    continue;
                }

                let image = match source.extract_image(placement.image) {
                    Ok(image) => image,
                    Err(reason) => {
                        self.report.warn(Diagnostic::UnsupportedImage {
                            document: path.to_path_buf(),
                            page,
                            position,
                            reason,
                        });
                        continue;
                    }
                };

                match role {
                    PageRole::Front => {
                        write_card(&dirs.front, &name, &image)?;
                        self.report.fronts += 1;
                        if mode == DocumentMode::Alternating && !pairing.is_mismatched(page) {
                            pairing.record_front(page, position, name);
                        }
                    }
                    PageRole::Back if common.is_common(placement.image) => {
                        let common_name = common.next_name(prefix);
                        write_card(&dirs.back, &common_name, &image)?;
                        log::info!(
                            "Page {}: common back saved as {} ({} uses)",
                            page,
                            common_name,
                            common.occurrences(placement.image)
                        );
                        common.mark_saved(placement.image, common_name);
                        self.report.common_backs += 1;
                    }
                    PageRole::Back => {
                        let paired = pairing.front_for_back(page, position).map(str::to_string);
                        match paired {
                            Some(front_name) => {
                                write_card(&dirs.double_sided, &front_name, &image)?;
                                self.report.paired_backs += 1;
                            }
                            None if mismatched_backs.contains(&page) => {
                                let back_name = unpaired_back_name(prefix, page, position);
                                write_card(&dirs.double_sided, &back_name, &image)?;
                            }
                            None => {
                                write_card(&dirs.double_sided, &name, &image)?;
                                match mode {
                                    DocumentMode::Alternating
                                        if !pairing.is_mismatched(page - 1) =>
                                    {
                                        self.report.warn(Diagnostic::UnmatchedBack {
                                            document: path.to_path_buf(),
                                            page,
                                            position,
                                        });
                                    }
                                    // Same name as the front at this page and position
                                    DocumentMode::BacksOnly if fronts_paired_with(page).is_some() => {
                                        self.report.paired_backs += 1;
                                    }
                                    _ => {}
                                }
                            }
                        }
                        self.report.unique_backs += 1;
                    }
                }
            }
        }

        Ok(pages.iter().map(|cards| cards.as_ref().map(Vec::len)).collect())
    }
}
