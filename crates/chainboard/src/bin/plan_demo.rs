//! Build a demo scenario and print a plan summary.
//!
//! Usage: `plan_demo [--summary-only] <scenario>`

use std::env;
use std::process;

use chainboard::{build_scenario, DemoScenario};

fn main() {
    let mut summary_only = false;
    let mut scenario_arg: Option<String> = None;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--summary-only" => summary_only = true,
            other => scenario_arg = Some(other.to_string()),
        }
    }

    let Some(name) = scenario_arg else {
        eprintln!("usage: plan_demo [--summary-only] <minimal|smelter_chain|saturated_split>");
        process::exit(2);
    };
    let Some(scenario) = DemoScenario::parse(&name) else {
        eprintln!("unknown scenario: {name}");
        process::exit(2);
    };

    let kernel = match build_scenario(scenario) {
        Ok(kernel) => kernel,
        Err(err) => {
            eprintln!("failed to build scenario: {err:?}");
            process::exit(1);
        }
    };

    let graph = kernel.graph();
    let totals = graph.totals();
    let flow_total: f64 = graph.edges.values().map(|e| e.amount).sum();
    println!("scenario: {}", scenario.as_str());
    println!("nodes: {}", graph.nodes.len());
    println!("edges: {}", graph.edges.len());
    println!("flow_per_min: {flow_total}");
    println!("workers: {}", totals.workers);
    println!("electricity_consumed: {}", totals.electricity_consumed);
    println!("events: {}", kernel.journal().len());

    if summary_only {
        return;
    }
    for node in graph.nodes.values() {
        println!(
            "node {} {} x{} @ ({}, {})",
            node.id, node.attributes.name, node.multiplier, node.pos.x, node.pos.y
        );
    }
    for edge in graph.edges.values() {
        println!(
            "edge {} {} -> {} [{}]: {}",
            edge.id, edge.supplier, edge.consumer, edge.product, edge.amount
        );
    }
}
