//! Benchmark for draft generation and candidate listing.
//!
//! Run with: cargo run --release --bin bench

use shift_scheduling::conflicts::ConflictEvaluator;
use shift_scheduling::demo_data::{self, DemoData};
use shift_scheduling::generator::DraftGenerator;
use shift_scheduling::index::{AvailabilityIndex, CapabilityIndex};
use shift_scheduling::staging::StagingLayer;
use shift_scheduling::store::AssignmentSnapshot;
use std::time::Instant;

const ROUNDS: u32 = 200;

fn main() {
    let roster = demo_data::generate(DemoData::Large);
    let range = demo_data::schedule_range(DemoData::Large);

    println!("Benchmark: Draft Generation");
    println!("  Courses: {}", roster.courses.len());
    println!("  Drivers: {}", roster.drivers.len());
    println!("  Days: {}", range.len_days());
    println!();

    let index_start = Instant::now();
    let capability = CapabilityIndex::build(&roster.drivers);
    let availability = AvailabilityIndex::build_for_range(&roster.day_offs, range);
    println!("Indices built ({:?})", index_start.elapsed());

    let generator = DraftGenerator::new(&roster.courses, &capability, &availability);
    let first = generator.generate(range);

    // Repeated runs must reproduce the first grid exactly
    let gen_start = Instant::now();
    for _ in 0..ROUNDS {
        let grid = generator.generate(range);
        assert_eq!(grid, first, "Draft not deterministic!");
    }
    let gen_elapsed = gen_start.elapsed();

    println!("Generation:");
    println!("  Rounds: {}", ROUNDS);
    println!("  Cells/round: {}", first.cells().len());
    println!("  Filled: {}, unfilled: {}", first.filled_count(), first.unfilled_count());
    println!("  Time: {:.2?}", gen_elapsed);
    println!(
        "  Rounds/sec: {:.0}",
        ROUNDS as f64 / gen_elapsed.as_secs_f64()
    );
    println!();

    let staging = StagingLayer::new(AssignmentSnapshot::from_assignments(first.cells().iter().cloned()));
    let evaluator = ConflictEvaluator::new(&capability, &availability);

    let list_start = Instant::now();
    let mut listed: u64 = 0;
    for _ in 0..ROUNDS {
        for cell in first.cells() {
            listed += evaluator
                .available_drivers(&staging, cell.date, &cell.course_id)
                .len() as u64;
        }
    }
    let list_elapsed = list_start.elapsed();
    let queries = ROUNDS as u64 * first.cells().len() as u64;

    println!("Candidate listing:");
    println!("  Queries: {}", queries);
    println!("  Candidates returned: {}", listed);
    println!("  Time: {:.2?}", list_elapsed);
    println!(
        "  Queries/sec: {:.0}",
        queries as f64 / list_elapsed.as_secs_f64()
    );
}
