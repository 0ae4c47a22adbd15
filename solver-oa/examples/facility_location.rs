//! Quadratic facility location with lazily approximated assignment costs.
//!
//! Run with: cargo run --release -p solver-oa --example facility_location

use std::time::Instant;

use solver_oa::search::{ReferenceModel, Sense};
use solver_oa::settings::SearchSettings;
use solver_oa::{ConvexTerm, Evaluator, Gradient, HostModel, OaResult, OaSettings, OuterApproximation};

const FACILITY_COST: f64 = 3000.0;
const DEMAND: f64 = 2.0;

fn main() -> OaResult<()> {
    println!("=== Quadratic Facility Location ===\n");

    // Assignment costs, facility i by customer j
    let costs = [
        [8412.0, 1207.0, 5530.0],
        [2391.0, 7765.0, 903.0],
        [4120.0, 3318.0, 6874.0],
        [967.0, 9120.0, 2450.0],
        [5675.0, 4402.0, 3981.0],
    ];
    let facilities = costs.len();
    let customers = costs[0].len();

    let mut model = ReferenceModel::new(SearchSettings::default());
    let y: Vec<_> = (0..facilities)
        .map(|i| model.add_binary(&format!("open_{}", i), FACILITY_COST))
        .collect();
    let x: Vec<Vec<_>> = (0..facilities)
        .map(|i| {
            (0..customers)
                .map(|j| model.add_integer(&format!("assign_{}_{}", i, j), 0.0, DEMAND, 0.0))
                .collect()
        })
        .collect();
    model.update()?;

    for j in 0..customers {
        let served: Vec<_> = (0..facilities).map(|i| (x[i][j], 1.0)).collect();
        model.add_row(&served, Sense::Eq, DEMAND)?;
    }
    for i in 0..facilities {
        for j in 0..customers {
            model.add_row(&[(x[i][j], 1.0), (y[i], -DEMAND)], Sense::Le, 0.0)?;
        }
    }

    let mut terms = Vec::new();
    for i in 0..facilities {
        for j in 0..customers {
            let c = costs[i][j];
            terms.push(ConvexTerm::new(
                Evaluator::unary(move |v| c * v * v),
                Gradient::unary(move |v| vec![2.0 * c * v]),
                vec![x[i][j]],
                vec![vec![0.0], vec![DEMAND]],
            )?);
        }
    }

    let settings = OaSettings::default().with_heuristic(true);
    let start = Instant::now();
    let mut oa = OuterApproximation::new(model, &terms, settings)?;
    let status = oa.optimize()?;
    let elapsed = start.elapsed();

    println!("Status:          {:?}", status);
    println!("Host objective:  {:.2}", oa.objective_value()?);
    println!("True objective:  {:.2}", oa.best_true_objective());
    println!("Time:            {:.2?}", elapsed);

    let stats = oa.stats();
    println!(
        "Cuts:            {} starting, {} lazy",
        stats.starting_cuts, stats.lazy_cuts
    );
    println!("Suggestions:     {}", stats.suggestions);

    if let Some(solution) = oa.model().solution() {
        println!("Nodes explored:  {}", solution.nodes_explored);
        println!("\nOpen facilities:");
        for (i, &open) in y.iter().enumerate() {
            if solution.x[open.index()] > 0.5 {
                let served: Vec<String> = (0..customers)
                    .filter(|&j| solution.x[x[i][j].index()] > 0.5)
                    .map(|j| format!("customer {} x{}", j, solution.x[x[i][j].index()]))
                    .collect();
                println!("  facility {}: {}", i, served.join(", "));
            }
        }
    }

    Ok(())
}
