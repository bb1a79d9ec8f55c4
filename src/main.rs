use clap::Parser;
use reel_planner::catalog;
use reel_planner::config::MachineConfig;
use reel_planner::planner::{Planner, ProductionPlan};
use reel_planner::render;
use reel_planner::types::{BoxSpec, FoldedDims, ProductionRequest, ReelChoice, ReelProfile};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "reel_planner",
    about = "Corrugated box production planner: reel passes with at most two cut lengths"
)]
struct Cli {
    /// Custom box by folded dimensions in mm as LxWxH:qty (e.g. 200x200x100:1000)
    #[arg(long = "box", num_args = 1..)]
    boxes: Vec<String>,

    /// Catalog box as ID:qty, IDs are LxWxH in cm (e.g. 30x20x15:200)
    #[arg(long = "catalog", num_args = 1..)]
    catalog: Vec<String>,

    /// Reel to plan on: auto, 1.60 or 1.30
    #[arg(long, default_value = "auto", value_parser = parse_reel_choice)]
    reel: ReelChoice,

    /// Usable width of the 1.60m reel in mm
    #[arg(long, default_value_t = 1520)]
    wide_usable: u32,

    /// Usable width of the 1.30m reel in mm
    #[arg(long, default_value_t = 1230)]
    narrow_usable: u32,

    /// Maximum passes per reel before the plan is returned as partial
    #[arg(long, default_value_t = reel_planner::config::DEFAULT_MAX_PASSES)]
    max_passes: usize,

    /// Show ASCII layout of each pass
    #[arg(long)]
    layout: bool,

    /// Print the full plan as JSON
    #[arg(long)]
    json: bool,

    /// Log each committed pass to stderr
    #[arg(long)]
    verbose: bool,
}

fn parse_reel_choice(s: &str) -> Result<ReelChoice, String> {
    match s.parse::<ReelChoice>()? {
        ReelChoice::Forced(id)
            if id.as_str() != catalog::WIDE_REEL && id.as_str() != catalog::NARROW_REEL =>
        {
            Err(format!(
                "invalid reel '{}', expected: auto, {}, or {}",
                id,
                catalog::WIDE_REEL,
                catalog::NARROW_REEL
            ))
        }
        choice => Ok(choice),
    }
}

fn parse_folded(s: &str) -> Result<FoldedDims, String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 3 {
        return Err(format!("invalid dimensions '{}', expected LxWxH", s));
    }
    let parse = |part: &str, what: &str| {
        part.parse::<u32>()
            .map_err(|_| format!("invalid {} in '{}'", what, s))
    };
    Ok(FoldedDims {
        length: parse(parts[0], "length")?,
        width: parse(parts[1], "width")?,
        height: parse(parts[2], "height")?,
    })
}

fn split_qty(s: &str) -> Result<(&str, u32), String> {
    let (key, qty) = s
        .split_once(':')
        .ok_or_else(|| format!("invalid entry '{}', expected ...:qty", s))?;
    let qty = qty
        .parse::<u32>()
        .map_err(|_| format!("invalid quantity in '{}'", s))?;
    Ok((key, qty))
}

fn collect_input(
    cli: &Cli,
    config: &MachineConfig,
) -> Result<(Vec<BoxSpec>, Vec<ProductionRequest>), String> {
    let mut boxes = catalog::standard_boxes(config).map_err(|e| e.to_string())?;
    let mut requests = Vec::new();

    for entry in &cli.catalog {
        let (id, qty) = split_qty(entry)?;
        requests.push(ProductionRequest::new(id, qty));
    }

    for entry in &cli.boxes {
        let (dims, qty) = split_qty(entry)?;
        let folded = parse_folded(dims)?;
        let id = format!("{}mm", folded);
        if !boxes.iter().any(|b| b.id.as_str() == id) {
            let spec = BoxSpec::from_folded(id.clone(), id.clone(), folded, config)
                .map_err(|e| e.to_string())?;
            boxes.push(spec);
        }
        requests.push(ProductionRequest::new(id, qty));
    }

    if requests.is_empty() {
        return Err("nothing to plan, pass --box or --catalog".to_string());
    }
    Ok((boxes, requests))
}

fn print_plan(plan: &ProductionPlan, layout: bool) {
    let Some(run) = plan.selected_run() else {
        return;
    };

    println!("Reel {}", run.reel);
    for (i, pass) in run.passes.iter().enumerate() {
        let lengths: Vec<String> = pass.cut_lengths.iter().map(|l| l.to_string()).collect();
        println!(
            "Pass {}: {} row{}, cuts {}mm, {:.1}% waste, {:.2} m",
            i + 1,
            pass.rows,
            if pass.rows == 1 { "" } else { "s" },
            lengths.join("/"),
            pass.waste_percent,
            pass.linear_meters,
        );
        for slot in &pass.slots {
            println!(
                "  {} x{} ({}x{}mm)",
                slot.box_id, slot.count, slot.plate_length, slot.plate_height
            );
        }
        if layout {
            print!("{}", render::render_pass(pass));
        }
        println!();
    }

    for id in &run.unplaceable {
        println!("Unplaceable on {}: {}", run.reel.id, id);
    }
    for residual in &run.residual {
        println!(
            "Still pending after {} passes: {} ({} plates)",
            run.totals.passes, residual.box_id, residual.plates
        );
    }

    println!(
        "Summary: {} pass{}, {} plates, {:.2} m of reel, {:.1}% waste",
        run.totals.passes,
        if run.totals.passes == 1 { "" } else { "es" },
        run.totals.total_plates,
        run.totals.total_linear_meters,
        run.totals.weighted_waste_percent,
    );

    for other in plan.runs.iter().filter(|r| r.reel.id != run.reel.id) {
        println!(
            "  vs {}: {} passes, {:.2} m, {:.1}% waste",
            other.reel.id,
            other.totals.passes,
            other.totals.total_linear_meters,
            other.totals.weighted_waste_percent,
        );
    }

    if !plan.suggestions.is_empty() {
        println!();
        println!("Quantity suggestions:");
        for s in &plan.suggestions {
            println!(
                "  {}: {} -> {} ({:+}) on {}, {} rows of {}, {:.1}% waste, {}",
                s.box_id,
                s.original_qty,
                s.suggested_qty,
                s.difference,
                s.reel,
                s.rows,
                s.boxes_per_row,
                s.waste_percent,
                s.reason,
            );
        }
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let config = MachineConfig {
        max_passes: cli.max_passes,
        ..MachineConfig::default()
    };

    let (boxes, requests) = collect_input(&cli, &config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let reels = vec![
        ReelProfile::new(catalog::WIDE_REEL, 1600, cli.wide_usable),
        ReelProfile::new(catalog::NARROW_REEL, 1300, cli.narrow_usable),
    ];

    let plan = Planner::new(reels, config)
        .and_then(|planner| planner.plan(&boxes, &requests, &cli.reel))
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    if cli.json {
        match serde_json::to_string_pretty(&plan) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    print_plan(&plan, cli.layout);
}
