//! Page worker threads.
//!
//! Each worker pulls pages from the shared queue, runs detection,
//! calibration, assignment and highlight geometry for that page, and sends
//! the finished `PageOutcome` back to the collector. Workers share only
//! read-only inputs.

use std::collections::BTreeMap;
use std::sync::mpsc::{channel, Sender};
use std::thread;

use crate::calibration::calibrate;
use crate::detection::{load_page_raster, PageDetector};
use crate::highlight::page_segments;
use crate::page::{Page, PageClass};
use crate::pipeline::assign::assign_verses;
use crate::pipeline::queue::{create_work_queue, next_item, SharedReceiver};
use crate::pipeline::{PageContext, PageOutcome};

/// Runs the full per-page computation. Never fails: an unreadable raster
/// or a detection shortfall becomes an issue on the outcome.
pub fn process_page(page: Page, ctx: &PageContext) -> PageOutcome {
    let verses = ctx.mapping.verses(page);
    let class = page.class();

    let raster = load_page_raster(&ctx.images_dir.join(page.image_file_name()));
    let detector = PageDetector::new(
        raster,
        ctx.templates.for_class(class),
        // Circle recentring always uses the standard glyph size
        PageClass::Standard.template_size(),
        &ctx.config.circles,
    );

    let outcome = calibrate(
        &detector,
        verses.len(),
        ctx.config.default_threshold(class),
        ctx.config,
    );
    let assignment = assign_verses(page, verses, &outcome);

    if let Some(issue) = &assignment.issue {
        crate::log(&format!(
            "Page {}: expected {}, detected {}, {} placeholder(s) ({:?})",
            page, issue.expected, issue.detected, assignment.synthesized, outcome.method
        ));
    }

    let segments = page_segments(&assignment.markers);
    PageOutcome {
        page,
        markers: assignment.markers,
        segments,
        issue: assignment.issue,
    }
}

fn run_worker(queue: &SharedReceiver, ctx: &PageContext, results: Sender<PageOutcome>) {
    while let Some(item) = next_item(queue) {
        let outcome = process_page(item.page, ctx);
        if results.send(outcome).is_err() {
            // Collector is gone; nothing left to report to
            break;
        }
    }
}

/// Processes `pages` on `workers` threads and returns outcomes ordered by page.
pub fn run_pages(pages: &[Page], ctx: &PageContext, workers: usize) -> Vec<PageOutcome> {
    let queue = create_work_queue(pages.iter().copied());
    let (sender, receiver) = channel::<PageOutcome>();
    let total = pages.len();

    crate::log(&format!(
        "Processing {} pages on {} workers",
        total,
        workers.max(1)
    ));

    thread::scope(|s| {
        for _ in 0..workers.max(1) {
            let sender = sender.clone();
            let queue = &queue;
            s.spawn(move || run_worker(queue, ctx, sender));
        }
        drop(sender);

        let mut outcomes = BTreeMap::new();
        for outcome in receiver {
            outcomes.insert(outcome.page, outcome);
            if outcomes.len() % 100 == 0 {
                crate::log(&format!("Processed {}/{}...", outcomes.len(), total));
            }
        }
        outcomes.into_values().collect()
    })
}
