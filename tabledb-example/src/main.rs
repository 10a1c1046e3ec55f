use serde::{Deserialize, Serialize};
use tabledb::{table, Database, DatabaseConfig, Table, Tables};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Player {
    name: String,
    age: u32,
}

/// Host object: every `Table` field is persisted, `title` is not.
#[derive(Tables)]
struct ScoreBoard {
    #[table(rename = "Scores")]
    scores: Table<i64>,
    #[table(rename = "Players")]
    players: Table<Player>,
    title: String,
}

impl Default for ScoreBoard {
    fn default() -> Self {
        ScoreBoard {
            scores: table![12, 34],
            players: Table::new(),
            title: "Weekly scoreboard".to_string(),
        }
    }
}

fn config() -> Result<DatabaseConfig, tabledb::TableDbError> {
    match std::env::args().nth(1) {
        Some(path) if path.ends_with(".yaml") || path.ends_with(".yml") => {
            DatabaseConfig::from_yaml_file(path.as_ref())
        }
        Some(path) => Ok(DatabaseConfig::new(path)),
        None => Ok(DatabaseConfig::new("data/scoreboard.json").pretty(true)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = config()?;
    log::info!("Using document at {}", config.path.display());

    // Blocking open: loads eagerly, then saves once more when closed.
    let mut db = Database::open(config.clone(), ScoreBoard::default())?;
    db.scores.add(45);
    if !db.players.iter().any(|p| p.name == "Ada") {
        db.players.add(Player {
            name: "Ada".to_string(),
            age: 30,
        });
    }
    db.save()?;
    println!("{}: {:?}", db.title, db.scores.as_slice());
    db.close()?;

    // Async open over the same file sees what was just written.
    let mut db = Database::open_async(config.load_late(true), ScoreBoard::default()).await?;
    let report = db.load_async().await?;
    println!(
        "Reloaded {} table(s): {} score(s), {} player(s), {} element(s) dropped",
        report.tables.len(),
        db.scores.count(),
        db.players.count(),
        report.dropped()
    );
    log::info!("Load report: {}", serde_json::to_string(&report)?);
    println!("{}", serde_json::to_string_pretty(db.players.as_slice())?);
    db.save_async().await?;
    let _ = db.into_inner();

    Ok(())
}
