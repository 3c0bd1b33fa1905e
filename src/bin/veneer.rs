use std::{
    cell::Cell,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use veneer::{
    BridgeOpts, BridgeOutcome, CommitPayload, DrawCommand, EngineOpts, FrameState,
    InMemoryLabelIndex, LabelOperator, OverlayDoc, OverlayEngine, PersistenceBridge, Point,
    RecordingTarget, SceneId, VeneerError, VeneerResult, decode_mask,
};

#[derive(Parser, Debug)]
#[command(name = "veneer", version)]
struct Cli {
    /// Log at debug level (`RUST_LOG` overrides).
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the back-to-front draw order.
    Order(SceneArgs),
    /// Rank overlays under a pointer position.
    Hit(HitArgs),
    /// Run a render pass (decoding masks from disk) and print the draw commands.
    Paint(PaintArgs),
    /// Push every overlay through the persistence bridge and print the operator calls.
    Export(SceneArgs),
}

#[derive(Parser, Debug)]
struct SceneArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Active fields, bottom to top. Defaults to the scene file's list.
    #[arg(long, value_delimiter = ',')]
    fields: Option<Vec<String>>,
}

#[derive(Parser, Debug)]
struct HitArgs {
    #[command(flatten)]
    scene: SceneArgs,

    #[arg(long)]
    x: f64,

    #[arg(long)]
    y: f64,
}

#[derive(Parser, Debug)]
struct PaintArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Pointer position as `x,y`.
    #[arg(long, value_delimiter = ',')]
    pointer: Option<Vec<f64>>,

    /// Static (thumbnail) pass: no hit-testing.
    #[arg(long = "static")]
    static_mode: bool,

    /// Directory mask locators are resolved against. Defaults to the scene file's directory.
    #[arg(long)]
    masks: Option<PathBuf>,
}

/// On-disk scene: one sample and its label documents.
#[derive(serde::Deserialize, Debug)]
struct SceneFile {
    sample_id: String,
    #[serde(default)]
    active_fields: Vec<String>,
    #[serde(default)]
    opts: EngineOpts,
    #[serde(default)]
    bridge: BridgeOpts,
    #[serde(default)]
    overlays: Vec<OverlayDoc>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Order(args) => cmd_order(args),
        Command::Hit(args) => cmd_hit(args),
        Command::Paint(args) => cmd_paint(args),
        Command::Export(args) => cmd_export(args),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_scene_json(path: &Path) -> anyhow::Result<SceneFile> {
    let f = File::open(path).with_context(|| format!("open scene '{}'", path.display()))?;
    let r = BufReader::new(f);
    let scene: SceneFile = serde_json::from_reader(r).with_context(|| "parse scene JSON")?;
    Ok(scene)
}

fn load_engine(args: &SceneArgs) -> anyhow::Result<(SceneFile, OverlayEngine, FrameState)> {
    let mut file = read_scene_json(&args.in_path)?;
    let mut engine = OverlayEngine::new(
        SceneId::new(args.in_path.display().to_string()),
        file.sample_id.clone(),
        file.opts.clone(),
    )?;
    engine.load(std::mem::take(&mut file.overlays))?;
    let frame = FrameState {
        sample_id: file.sample_id.clone(),
        active_fields: args
            .fields
            .clone()
            .unwrap_or_else(|| file.active_fields.clone()),
        ..FrameState::default()
    };
    Ok((file, engine, frame))
}

fn cmd_order(args: SceneArgs) -> anyhow::Result<()> {
    let (_, mut engine, frame) = load_engine(&args)?;
    let list = engine.hit_list(&frame.active_fields, None);
    for (i, id) in list.ordered().iter().enumerate() {
        let o = engine
            .scene()
            .get(id)
            .with_context(|| format!("overlay '{id}' vanished"))?;
        println!("{i:>4}  {id}  {}  {}", o.kind().as_str(), o.field());
    }
    Ok(())
}

fn cmd_hit(args: HitArgs) -> anyhow::Result<()> {
    let (_, mut engine, frame) = load_engine(&args.scene)?;
    let point = Point::new(args.x, args.y);
    let list = engine.hit_list(&frame.active_fields, Some(point));
    for id in list.hits() {
        let d = engine.scene().get(id).map_or(f64::NAN, |o| o.distance_to(point));
        println!("hit   {id}  distance={d:.3}");
    }
    for id in list.rest() {
        println!("miss  {id}");
    }
    Ok(())
}

fn cmd_paint(args: PaintArgs) -> anyhow::Result<()> {
    let (_, mut engine, mut frame) = load_engine(&args.scene)?;
    frame.static_mode = args.static_mode;
    if let Some(p) = args.pointer.as_deref() {
        anyhow::ensure!(p.len() == 2, "--pointer expects x,y");
        frame.pointer = Some(Point::new(p[0], p[1]));
    }

    let masks_root = match &args.masks {
        Some(dir) => dir.clone(),
        None => args
            .scene
            .in_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
    };
    for ticket in engine.take_decode_requests() {
        let path = masks_root.join(&ticket.source);
        let decoded = std::fs::read(&path)
            .with_context(|| format!("read mask '{}'", path.display()))
            .map_err(VeneerError::from)
            .and_then(|bytes| decode_mask(&bytes));
        engine.complete_decode(&ticket, decoded)?;
    }

    let mut target = RecordingTarget::new();
    let report = engine.render(&frame, &mut target)?;
    for cmd in target.commands() {
        println!("{}", describe(cmd));
    }
    eprintln!(
        "drawn={} pending={} hits={}",
        report.drawn.len(),
        report.pending.len(),
        report.hits.hit_count()
    );
    Ok(())
}

fn describe(cmd: &DrawCommand) -> String {
    match cmd {
        DrawCommand::BeginOverlay(id) => format!("overlay {id}"),
        DrawCommand::StrokePath { path, width, .. } => {
            format!("  stroke {} elements width={width}", path.elements().len())
        }
        DrawCommand::FillPath { path, .. } => format!("  fill {} elements", path.elements().len()),
        DrawCommand::Text { at, text, .. } => format!("  text {text:?} at ({}, {})", at.x, at.y),
        DrawCommand::Mask { width, height, .. } => format!("  mask {width}x{height}"),
    }
}

/// Operator that prints each call as a JSON line and always succeeds.
#[derive(Default)]
struct StdoutOperator {
    calls: Cell<usize>,
}

impl LabelOperator for StdoutOperator {
    async fn execute(
        &self,
        operator: &str,
        payload: serde_json::Value,
    ) -> VeneerResult<serde_json::Value> {
        self.calls.set(self.calls.get() + 1);
        println!("{}", serde_json::json!({ "operator": operator, "payload": payload }));
        Ok(serde_json::Value::Null)
    }
}

fn cmd_export(args: SceneArgs) -> anyhow::Result<()> {
    let (file, engine, _) = load_engine(&args)?;
    let bridge =
        PersistenceBridge::new(StdoutOperator::default(), InMemoryLabelIndex::new(), file.bridge);

    let mut failed = 0usize;
    for o in engine.scene().iter() {
        let payload = CommitPayload::from_overlay(engine.scene().sample_id(), o);
        if let BridgeOutcome::Failed(err) = pollster::block_on(bridge.commit(payload)) {
            tracing::warn!(overlay = %o.id(), error = %err, "export failed");
            failed += 1;
        }
    }

    let (op, index) = bridge.into_parts();
    eprintln!("calls={} indexed={} failed={failed}", op.calls.get(), index.len());
    Ok(())
}
