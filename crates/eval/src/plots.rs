use anyhow::Result;
use plotters::prelude::*;

use crate::benchmark::BenchmarkResults;

pub fn generate_plots(results: &BenchmarkResults, output_dir: &str) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;

    // Plot 1: Latency per scenario
    plot_latency_by_scenario(results, &format!("{}/latency_by_scenario.png", output_dir))?;

    // Plot 2: Network risk per scenario
    plot_risk_by_scenario(results, &format!("{}/risk_by_scenario.png", output_dir))?;

    Ok(())
}

fn plot_latency_by_scenario(results: &BenchmarkResults, path: &str) -> Result<()> {
    let root = BitMapBackend::new(path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let count = results.scenarios.len().max(1);
    let max_latency = results
        .scenarios
        .iter()
        .map(|s| s.p95_latency_ms)
        .fold(0.0f64, f64::max)
        .max(f64::EPSILON);

    let mut chart = ChartBuilder::on(&root)
        .caption("Network Analysis Latency (ms)", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..count as f64, 0f64..(max_latency * 1.2))?;

    chart
        .configure_mesh()
        .y_desc("Latency (ms)")
        .x_desc("Scenario (index)")
        .draw()?;

    chart
        .draw_series(results.scenarios.iter().enumerate().map(|(i, s)| {
            Rectangle::new([(i as f64 + 0.15, 0.0), (i as f64 + 0.5, s.p50_latency_ms)], BLUE.filled())
        }))?
        .label("p50")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], BLUE.filled()));

    chart
        .draw_series(results.scenarios.iter().enumerate().map(|(i, s)| {
            Rectangle::new([(i as f64 + 0.5, 0.0), (i as f64 + 0.85, s.p95_latency_ms)], RED.filled())
        }))?
        .label("p95")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], RED.filled()));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    println!("Saved latency plot to {}", path);
    Ok(())
}

fn plot_risk_by_scenario(results: &BenchmarkResults, path: &str) -> Result<()> {
    let root = BitMapBackend::new(path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let count = results.scenarios.len().max(1);

    let mut chart = ChartBuilder::on(&root)
        .caption("Network Risk by Scenario", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..count as f64, 0f64..1.0f64)?;

    chart
        .configure_mesh()
        .y_desc("Network risk")
        .x_desc("Scenario (index)")
        .draw()?;

    for (i, scenario) in results.scenarios.iter().enumerate() {
        // Saturated cycle enumeration drawn in red
        let color = if scenario.cycles_saturated { RED } else { GREEN };
        chart.draw_series(std::iter::once(Circle::new(
            (i as f64 + 0.5, scenario.network_risk),
            6,
            color.filled(),
        )))?;
    }

    root.present()?;
    println!("Saved risk plot to {}", path);
    Ok(())
}
