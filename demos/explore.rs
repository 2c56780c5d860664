use std::rc::Rc;

use clap::Parser;
use num_bigint::BigUint;

use logic_diagram::config::DiagramConfig;
use logic_diagram::controller::{Diagram, LayoutOutcome};
use logic_diagram::engine::{describe_input, parse_index, ExpressionEngine};
use logic_diagram::enumerate::Enumerator;
use logic_diagram::layout::LayeredLayout;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Expression index.
    #[arg(value_name = "INDEX", default_value = "16")]
    index: String,

    /// Variables to flip after the diagram is shown.
    #[arg(long = "toggle", value_name = "VAR")]
    toggles: Vec<String>,

    /// Maximal number of leaves (smaller limits start faster).
    #[arg(long, value_name = "INT", default_value = "100")]
    max_leaves: usize,

    /// Maximal number of NOT nodes.
    #[arg(long, value_name = "INT", default_value = "100")]
    max_unary: usize,

    /// Diagram configuration (JSON file).
    #[arg(long, value_name = "FILE")]
    config: Option<std::path::PathBuf>,

    /// Print the final diagram in DOT format.
    #[arg(long)]
    dot: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let args = Cli::parse();
    println!("args = {:?}", args);

    let config = match &args.config {
        Some(path) => DiagramConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => DiagramConfig::default(),
    };

    let engine = Rc::new(Enumerator::with_limits(args.max_leaves, args.max_unary));
    println!("{} expressions", engine.count());
    println!("#{} = {}", args.index, describe_input(engine.as_ref(), &args.index));

    let Some(index) = parse_index(&args.index) else {
        return Ok(());
    };

    let diagram = Diagram::new(engine, Rc::new(LayeredLayout), config);
    let outcome = match futures::executor::block_on(diagram.show(&index)) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::warn!("{}", e);
            return Ok(());
        }
    };
    if outcome != LayoutOutcome::Applied {
        println!("layout {:?}", outcome);
        return Ok(());
    }

    report(&diagram, &index);
    for var in &args.toggles {
        if diagram.toggle(var) {
            println!("\ntoggled {}", var);
            report(&diagram, &index);
        } else {
            println!("\n{} is not a variable of this expression", var);
        }
    }

    if args.dot {
        let c = diagram.controller();
        println!("\n{}", c.graph().to_dot(Some(c.evaluation()))?);
    }

    Ok(())
}

fn report(diagram: &Diagram, index: &BigUint) {
    let c = diagram.controller();
    let controls: Vec<String> = c.controls().iter().map(|c| c.to_string()).collect();
    println!("[{}]", controls.join("] ["));

    for node in c.render_nodes() {
        let pos = node.position.map(|p| format!("({:.0}, {:.0})", p.x, p.y)).unwrap_or_default();
        println!("  {:<3} {:<4} {:<8} {}", node.id, node.label, node.style_class(), pos);
    }

    let output = match c.output() {
        Some(true) => "1",
        Some(false) => "0",
        None => "?",
    };
    println!("#{} {} = {}", index, c.text().unwrap_or_default(), output);
}
