use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use crimescene_assets::{AssetStore, import_room};
use crimescene_input::KeyCode;
use crimescene_kernel::SessionCommand;
use crimescene_physics::FIXED_TIMESTEP;
use crimescene_scene::{Scene, SceneConfig};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Upper bound on physics steps spent waiting for the player to land.
const SETTLE_STEPS: usize = 600;

#[derive(Parser)]
#[command(name = "crimescene-cli", about = "CLI tool for the crime scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SceneArgs {
    /// Assets directory holding models/ and scene.yaml
    #[arg(long, default_value = "./assets")]
    assets: PathBuf,

    /// Scene config; defaults to <assets>/scene.yaml
    #[arg(long)]
    config: Option<PathBuf>,
}

impl SceneArgs {
    fn load(&self) -> anyhow::Result<(SceneConfig, PathBuf)> {
        let path = self
            .config
            .clone()
            .unwrap_or_else(|| self.assets.join("scene.yaml"));
        let config = SceneConfig::load(&path)?;
        let room = config.room_path(&self.assets);
        Ok((config, room))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Check that every configured mesh name exists in the room
    Validate {
        #[command(flatten)]
        scene: SceneArgs,
    },
    /// List the room's meshes
    Inspect {
        #[command(flatten)]
        scene: SceneArgs,
        /// Also write the mesh registry as JSON
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Run the scene headless and print the player's debug report
    Simulate {
        #[command(flatten)]
        scene: SceneArgs,
        /// Physics steps at 60 Hz
        #[arg(short, long, default_value = "120")]
        steps: u32,
        /// Keys held for the whole run, e.g. `w,shift`
        #[arg(long, value_delimiter = ',')]
        hold: Vec<String>,
    },
}

/// Key names accepted by `simulate --hold`.
fn parse_key(name: &str) -> Option<KeyCode> {
    let code = match name.to_ascii_lowercase().as_str() {
        "w" => KeyCode::KeyW,
        "a" => KeyCode::KeyA,
        "s" => KeyCode::KeyS,
        "d" => KeyCode::KeyD,
        "b" => KeyCode::KeyB,
        "space" => KeyCode::Space,
        "shift" | "lshift" => KeyCode::ShiftLeft,
        "rshift" => KeyCode::ShiftRight,
        _ => return None,
    };
    Some(code)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("crimescene-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("physics: rapier, fixed step {:.4}s", FIXED_TIMESTEP);
            println!("defaults: {}", SceneConfig::default().room.display());
        }
        Commands::Validate { scene } => {
            let (config, room_path) = scene.load()?;
            let room = import_room(&room_path)?;
            let unmatched = config.unmatched_keys(room.mesh_names());
            println!("{}: {} meshes", room_path.display(), room.meshes.len());
            for (table, keys) in [
                ("info", &unmatched.info),
                ("masses", &unmatched.masses),
                ("alpha_blend", &unmatched.alpha_blend),
            ] {
                for key in keys {
                    println!("  {table}: no mesh named {key:?}");
                }
            }
            if !unmatched.is_empty() {
                anyhow::bail!("{} config keys name no mesh", unmatched.total());
            }
            println!("OK");
        }
        Commands::Inspect { scene, manifest } => {
            let (_, room_path) = scene.load()?;
            let room = import_room(&room_path)?;
            let store = AssetStore::from_room(&room);
            println!("{}: {} meshes", room_path.display(), store.len());
            for (id, record) in store.records() {
                println!(
                    "  {id} {:<28} parent={:<12} verts={:<5} tris={:<5} alpha={:?}",
                    record.name,
                    record.parent,
                    record.vertex_count,
                    record.triangle_count,
                    record.alpha_mode
                );
            }
            if let Some(path) = manifest {
                store.save(&path)?;
                println!("manifest written to {}", path.display());
            }
        }
        Commands::Simulate { scene, steps, hold } => {
            let keys = hold
                .iter()
                .map(|name| parse_key(name).with_context(|| format!("unknown key {name:?}")))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let (config, room_path) = scene.load()?;
            let mut scene = Scene::new(config)?;
            scene.load_blocking(&room_path)?;
            scene.apply(SessionCommand::ToggleDebug);
            // Jumps need a grounded player, so press the keys after landing.
            match scene.settle(FIXED_TIMESTEP, SETTLE_STEPS) {
                Some(taken) => println!("Player settled after {taken} steps"),
                None => tracing::warn!(max = SETTLE_STEPS, "player did not settle"),
            }
            for key in &keys {
                scene.handle_key(*key, true);
            }
            let delta = Duration::from_secs_f64(FIXED_TIMESTEP);
            for _ in 0..steps {
                scene.step(FIXED_TIMESTEP);
                scene.before_render(Instant::now(), delta);
            }

            let player = scene.player().context("player missing after load")?;
            println!("After {steps} steps:");
            println!("{}", player.hud().debug_panel().text);
            let info = player.hud().info_panel();
            if info.visible {
                println!("Info: {}", info.text.replace('\n', " | "));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_keys_parse_case_insensitively() {
        assert_eq!(parse_key("W"), Some(KeyCode::KeyW));
        assert_eq!(parse_key("shift"), Some(KeyCode::ShiftLeft));
        assert_eq!(parse_key("space"), Some(KeyCode::Space));
        assert_eq!(parse_key("q"), None);
    }

    #[test]
    fn cli_parses_simulate_flags() {
        let cli = Cli::try_parse_from([
            "crimescene-cli",
            "simulate",
            "--steps",
            "30",
            "--hold",
            "w,shift",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate { steps, hold, scene } => {
                assert_eq!(steps, 30);
                assert_eq!(hold, vec!["w", "shift"]);
                assert_eq!(scene.assets, PathBuf::from("./assets"));
            }
            _ => panic!("expected simulate"),
        }
    }
}
