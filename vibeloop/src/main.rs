//! vibeloop - daily practice cards, mood check-ins, mini-games and a VibeAGotchi
//!
//! Every command acts on one user (`--user`, default from config) and prints
//! plain text to stdout. Logs go to the XDG state directory.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/vibeloop/data.db (~/.local/share/vibeloop/data.db)
//! - Config: $XDG_CONFIG_HOME/vibeloop/config.toml (~/.config/vibeloop/config.toml)

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use vibeloop_core::dashboard::Dashboard;
use vibeloop_core::format::{format_relative_time, format_remaining, gauge_bar};
use vibeloop_core::games::{self, autopilot, GameEvent};
use vibeloop_core::mood;
use vibeloop_core::pet::items::{self, Requirement};
use vibeloop_core::pet::{evolution, Gauge, PetAction, PetKeeper, PetState};
use vibeloop_core::practice::{CardDeck, LocalCache, PracticeService, ReflectionDraft};
use vibeloop_core::wallet::{self, HolderCheck, SyncFunctionsClient, WalletKind};
use vibeloop_core::{open_store, Config, GameKind, Mood, Store};

const GAUGE_WIDTH: usize = 20;

#[derive(Parser)]
#[command(name = "vibeloop")]
#[command(about = "Daily practice cards, moods, mini-games and a VibeAGotchi")]
#[command(version)]
struct Args {
    /// User to act as (default: user.default_user from config)
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Look after your VibeAGotchi
    Pet {
        #[command(subcommand)]
        command: PetCommand,
    },

    /// Pull and reflect on today's practice card
    Card {
        #[command(subcommand)]
        command: CardCommand,
    },

    /// Log and review mood check-ins
    Mood {
        #[command(subcommand)]
        command: MoodCommand,
    },

    /// Play a headless round and submit the score
    Play {
        /// Game to play (blaster or bubbles)
        game: String,

        /// Seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Longest the round may last
        #[arg(long, default_value_t = 60.0)]
        seconds: f64,
    },

    /// Show the leaderboard
    Scores {
        /// Only this game (blaster or bubbles)
        #[arg(short, long)]
        game: Option<String>,

        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Connect or disconnect a wallet
    Wallet {
        #[command(subcommand)]
        command: WalletCommand,
    },

    /// Overview of streak, today's card, pet, scores and mood
    Dashboard {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PetCommand {
    /// Show gauges, stage and cooldowns
    Status,
    Feed,
    Clean,
    /// Cure sickness
    Heal,
    Breathe,
    Reflect,
    Play,
    /// Put to sleep or wake up
    Sleep,
    Tap,
    /// Give your pet a new name
    Rename { name: String },
    /// Evolution history and achievements
    History,
    /// Cosmetic items
    Items,
    /// Wear an owned item
    Equip { item: String },
    /// Take off the worn item
    Unequip,
}

impl PetCommand {
    fn action(&self) -> Option<PetAction> {
        match self {
            PetCommand::Feed => Some(PetAction::Feed),
            PetCommand::Clean => Some(PetAction::Clean),
            PetCommand::Heal => Some(PetAction::Heal),
            PetCommand::Breathe => Some(PetAction::Breathe),
            PetCommand::Reflect => Some(PetAction::Reflect),
            PetCommand::Play => Some(PetAction::Play),
            PetCommand::Sleep => Some(PetAction::Sleep),
            PetCommand::Tap => Some(PetAction::Tap),
            _ => None,
        }
    }
}

#[derive(Subcommand)]
enum CardCommand {
    /// Pull today's card (once per day)
    Pull,

    /// Complete today's practice with a reflection
    Reflect {
        #[arg(long)]
        text: String,

        /// 1 to 5
        #[arg(long)]
        rating: Option<u8>,

        /// Mood before the practice
        #[arg(long)]
        before: Option<String>,

        /// Mood after the practice
        #[arg(long)]
        after: Option<String>,
    },

    /// Past practices, newest first
    History {
        #[arg(short, long, default_value_t = 14)]
        limit: usize,
    },

    /// Save a card to favorites
    Favorite { card: String },

    /// Remove a card from favorites
    Unfavorite { card: String },

    /// List saved cards
    Favorites,
}

#[derive(Subcommand)]
enum MoodCommand {
    /// Record how you feel right now
    Log {
        /// radiant, joyful, calm, neutral, tired, anxious or sad
        mood: String,

        /// 1 to 5
        #[arg(short, long)]
        energy: u8,

        #[arg(short, long)]
        note: Option<String>,
    },

    /// Summarize recent check-ins
    Summary {
        #[arg(short, long, default_value_t = 7)]
        days: i64,
    },
}

#[derive(Subcommand)]
enum WalletCommand {
    /// Save an address and check holder eligibility
    Connect {
        /// algorand or evm
        #[arg(short, long)]
        chain: String,

        address: String,
    },

    /// Forget the saved address
    Disconnect,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging (to file, stdout is for command output)
    let _log_guard =
        vibeloop_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let user_id = args
        .user
        .clone()
        .unwrap_or_else(|| config.user.default_user.clone());

    let store = open_store(&config).context("failed to open store")?;
    let store = store.as_ref();
    let now = Utc::now();

    tracing::debug!(user_id = %user_id, backend = ?config.storage.backend, "Running command");

    match args.command {
        Command::Pet { command } => cmd_pet(store, &config, &user_id, command, now),
        Command::Card { command } => cmd_card(store, &config, &user_id, command, now),
        Command::Mood { command } => cmd_mood(store, &user_id, command, now),
        Command::Play {
            game,
            seed,
            seconds,
        } => cmd_play(store, &user_id, &game, seed, seconds, now),
        Command::Scores { game, limit } => cmd_scores(store, game.as_deref(), limit),
        Command::Wallet { command } => cmd_wallet(store, &config, &user_id, command, now),
        Command::Dashboard { json } => cmd_dashboard(store, &config, &user_id, json, now),
    }
}

fn parse_game(game: &str) -> Result<GameKind> {
    game.parse().map_err(|e: String| anyhow!(e))
}

fn parse_mood(mood: &str) -> Result<Mood> {
    mood.parse().map_err(|e: String| anyhow!(e))
}

// ============================================
// Pet
// ============================================

fn cmd_pet(
    store: &dyn Store,
    config: &Config,
    user_id: &str,
    command: PetCommand,
    now: DateTime<Utc>,
) -> Result<()> {
    let keeper = PetKeeper::new(store, &config.pet);

    if let Some(action) = command.action() {
        let outcome = keeper
            .interact(user_id, action, now)
            .with_context(|| format!("could not {}", action))?;
        println!(
            "You chose {}. {} feels {} (+{} XP).",
            action, outcome.state.name, outcome.state.current_emotion, outcome.xp_gained
        );
        if let Some(event) = &outcome.evolution {
            println!(
                "✨ {} evolved into a {}!",
                outcome.state.name, event.stage_name
            );
        }
        if let Some(achievement) = &outcome.achievement {
            println!("🏆 Achievement unlocked: {}", achievement.title);
        }
        return Ok(());
    }

    match command {
        PetCommand::Status => {
            let pet = keeper.load(user_id, now).context("failed to load pet")?;
            print_pet(&pet, now);
            println!();
            println!("Cooldowns:");
            for action in [
                PetAction::Feed,
                PetAction::Clean,
                PetAction::Breathe,
                PetAction::Play,
            ] {
                let remaining = keeper.cooldown_remaining(user_id, action, now)?;
                let label = match remaining {
                    Some(left) => format_remaining(left),
                    None => "ready".to_string(),
                };
                println!("  {:<8} {}", action.as_str(), label);
            }
        }
        PetCommand::Rename { name } => {
            let pet = keeper
                .rename(user_id, &name, now)
                .context("failed to rename pet")?;
            println!("Your pet is now called {}.", pet.name);
        }
        PetCommand::History => {
            let history = keeper.history(user_id)?;
            if history.is_empty() {
                println!("No evolutions yet.");
            }
            for event in &history {
                println!(
                    "{}  {:<8} at {} XP",
                    event.occurred_at.format("%Y-%m-%d %H:%M"),
                    event.stage_name,
                    event.growth_xp
                );
            }
            let achievements = keeper.achievements(user_id)?;
            if !achievements.is_empty() {
                println!();
                println!("Achievements:");
                for achievement in achievements {
                    println!("  🏆 {} - {}", achievement.title, achievement.description);
                }
            }
        }
        PetCommand::Items => {
            let pet = keeper.load(user_id, now)?;
            for item in &items::CATALOG {
                let status = if pet.equipped_item.as_deref() == Some(item.id) {
                    "equipped".to_string()
                } else if pet.owned_items.contains(item.id) {
                    "owned".to_string()
                } else {
                    match item.requirement {
                        Requirement::Stage(stage) => {
                            format!("unlocks at {}", evolution::stage_name(stage))
                        }
                        Requirement::Holder => "holders only".to_string(),
                    }
                };
                println!("  {:<14} {:<14} {}", item.id, item.name, status);
            }
        }
        PetCommand::Equip { item } => {
            keeper
                .equip_item(user_id, &item, now)
                .with_context(|| format!("could not equip {}", item))?;
            println!("Equipped {}.", item);
        }
        PetCommand::Unequip => match keeper.unequip_item(user_id, now)? {
            Some(item) => println!("Took off {}.", item),
            None => println!("Nothing is equipped."),
        },
        // Care actions were handled above
        _ => {}
    }
    Ok(())
}

fn print_pet(pet: &PetState, now: DateTime<Utc>) {
    let stage = evolution::stage_name(pet.evolution_stage);
    println!("{} the {} is {}", pet.name, stage, pet.current_emotion);
    let mut flags = Vec::new();
    if pet.is_sleeping {
        flags.push("sleeping");
    }
    if pet.is_sick {
        flags.push("sick");
    }
    if !flags.is_empty() {
        println!("({})", flags.join(", "));
    }
    println!();
    for gauge in Gauge::ALL {
        let value = pet.gauge(gauge);
        println!(
            "  {:<12} {} {:>3}",
            gauge.label(),
            gauge_bar(value, GAUGE_WIDTH),
            value
        );
    }
    println!();
    match evolution::xp_to_next(pet.growth_xp) {
        Some(left) => println!("Growth: {} XP ({} to next stage)", pet.growth_xp, left),
        None => println!("Growth: {} XP (fully evolved)", pet.growth_xp),
    }
    println!(
        "Harmony: {} (streak {})",
        pet.harmony(),
        pet.harmony_streak
    );
    if let Some(item) = &pet.equipped_item {
        println!("Wearing: {}", item);
    }
    println!(
        "Last interaction: {}",
        format_relative_time(pet.last_interaction, now)
    );
}

// ============================================
// Practice cards
// ============================================

fn cmd_card(
    store: &dyn Store,
    config: &Config,
    user_id: &str,
    command: CardCommand,
    now: DateTime<Utc>,
) -> Result<()> {
    let deck = CardDeck::standard();
    let service = PracticeService::new(store, &deck, &config.practice);
    let today = now.date_naive();

    match command {
        CardCommand::Pull => {
            let mut cache = LocalCache::open(&Config::cache_path());
            let mut rng = StdRng::from_entropy();
            let outcome = service
                .pull(&mut cache, &mut rng, user_id, today, now)
                .context("failed to pull today's card")?;
            if outcome.already_pulled {
                println!("You already pulled today's card.");
            }
            println!("{} ({})", outcome.card.title, outcome.card.category.as_str());
            println!("{}", outcome.card.prompt);
            if !outcome.synced {
                println!("(saved locally; it will sync next time)");
            }
        }
        CardCommand::Reflect {
            text,
            rating,
            before,
            after,
        } => {
            let draft = ReflectionDraft {
                text,
                rating,
                mood_before: before.as_deref().map(parse_mood).transpose()?,
                mood_after: after.as_deref().map(parse_mood).transpose()?,
            };
            let practice = service
                .complete(user_id, today, &draft, now)
                .context("failed to complete practice")?;
            println!("Practice complete for {}. Well done.", practice.date);
            if let Some(shift) = practice.mood_shift() {
                println!("Mood shift: {:+}", shift);
            }
        }
        CardCommand::History { limit } => {
            let history = service.history(user_id, limit)?;
            if history.is_empty() {
                println!("No practices yet. Try `vibeloop card pull`.");
            }
            for practice in history {
                let title = deck
                    .find(&practice.card_id)
                    .map(|c| c.title)
                    .unwrap_or_else(|| practice.card_id.clone());
                let mark = if practice.completed { "✓" } else { " " };
                println!("{} [{}] {}", practice.date, mark, title);
            }
        }
        CardCommand::Favorite { card } => {
            if service.add_favorite(user_id, &card, now)? {
                println!("Saved {} to favorites.", card);
            } else {
                println!("{} is already a favorite.", card);
            }
        }
        CardCommand::Unfavorite { card } => {
            if service.remove_favorite(user_id, &card)? {
                println!("Removed {} from favorites.", card);
            } else {
                println!("{} was not a favorite.", card);
            }
        }
        CardCommand::Favorites => {
            let favorites = service.favorites(user_id)?;
            if favorites.is_empty() {
                println!("No favorites yet.");
            }
            for (favorite, card) in favorites {
                println!(
                    "{:<14} {} (saved {})",
                    card.id,
                    card.title,
                    format_relative_time(favorite.saved_at, now)
                );
            }
        }
    }
    Ok(())
}

// ============================================
// Mood
// ============================================

fn cmd_mood(
    store: &dyn Store,
    user_id: &str,
    command: MoodCommand,
    now: DateTime<Utc>,
) -> Result<()> {
    match command {
        MoodCommand::Log { mood, energy, note } => {
            let mood = parse_mood(&mood)?;
            let pulse = mood::record_pulse(store, user_id, mood, energy, note.as_deref(), now)
                .context("failed to record mood")?;
            println!(
                "Logged {} {} with energy {}/5.",
                pulse.mood.emoji(),
                pulse.mood,
                pulse.energy
            );
        }
        MoodCommand::Summary { days } => {
            let since = now - Duration::days(days.max(1));
            let summary = mood::summary(store, user_id, since)?;
            println!("Last {} days: {} check-ins", days.max(1), summary.pulses);
            if let Some(dominant) = summary.dominant {
                println!("Mostly {} {}", dominant.emoji(), dominant);
            }
            for (mood, count) in &summary.counts {
                println!("  {:<8} {}", mood.as_str(), count);
            }
            if let Some(energy) = summary.average_energy {
                println!("Average energy: {:.1}", energy);
            }
            if let Some(shift) = summary.average_shift {
                println!(
                    "Average mood shift over {} practices: {:+.1}",
                    summary.practices, shift
                );
            }

            let notes: Vec<_> = mood::recent(store, user_id, since)?
                .into_iter()
                .filter(|p| p.note.is_some())
                .collect();
            if !notes.is_empty() {
                println!();
                println!("Notes:");
                for pulse in notes.iter().rev().take(5) {
                    println!(
                        "  {} {} {}",
                        format_relative_time(pulse.recorded_at, now),
                        pulse.mood.emoji(),
                        pulse.note.as_deref().unwrap_or_default()
                    );
                }
            }
        }
    }
    Ok(())
}

// ============================================
// Games
// ============================================

fn cmd_play(
    store: &dyn Store,
    user_id: &str,
    game: &str,
    seed: Option<u64>,
    seconds: f64,
    now: DateTime<Utc>,
) -> Result<()> {
    let kind = parse_game(game)?;
    let seed = seed.unwrap_or_else(rand::random);
    let run = autopilot::play(kind, seed, seconds);

    let levels = run
        .events
        .iter()
        .filter(|e| matches!(e, GameEvent::LevelComplete { .. }))
        .count();
    let score = games::submit_score(store, user_id, run.session.as_ref(), now)
        .context("failed to submit score")?;

    println!("{} (seed {})", kind.display_name(), seed);
    println!(
        "Score {} at level {} after {}s ({} levels cleared, {:?})",
        score.score,
        score.level_reached,
        score.duration_secs,
        levels,
        run.session.status()
    );
    if let Some(best) = games::personal_best(store, user_id, kind)? {
        if best.id == score.id {
            println!("New personal best!");
        }
    }
    Ok(())
}

fn cmd_scores(store: &dyn Store, game: Option<&str>, limit: usize) -> Result<()> {
    let kinds = match game {
        Some(game) => vec![parse_game(game)?],
        None => GameKind::ALL.to_vec(),
    };
    for kind in kinds {
        println!("{}", kind.display_name());
        let board = games::leaderboard(store, kind, limit)?;
        if board.is_empty() {
            println!("  no scores yet");
        }
        for (rank, entry) in board.iter().enumerate() {
            println!(
                "  {:>2}. {:<12} {:>6}  level {}",
                rank + 1,
                entry.user_id,
                entry.score,
                entry.level_reached
            );
        }
    }
    Ok(())
}

// ============================================
// Wallet
// ============================================

fn cmd_wallet(
    store: &dyn Store,
    config: &Config,
    user_id: &str,
    command: WalletCommand,
    now: DateTime<Utc>,
) -> Result<()> {
    match command {
        WalletCommand::Connect { chain, address } => {
            let kind: WalletKind = chain.parse().map_err(|e: String| anyhow!(e))?;
            let client = SyncFunctionsClient::new(&config.functions)
                .context("failed to create functions client")?;
            let checker = client.as_ref().map(|c| c as &dyn HolderCheck);

            let connection = wallet::connect_wallet(store, checker, user_id, kind, &address, now)
                .context("failed to connect wallet")?;
            println!(
                "Connected {} wallet {}",
                connection.kind.display_name(),
                connection.display
            );

            if connection.holder_eligible {
                let keeper = PetKeeper::new(store, &config.pet);
                for item in items::CATALOG
                    .iter()
                    .filter(|item| item.requirement == Requirement::Holder)
                {
                    if keeper.grant_item(user_id, item.id, true, now)? {
                        println!("🎁 Unlocked {}", item.name);
                    }
                }
            } else if client.is_none() {
                println!("Holder check skipped (no functions host configured).");
            } else {
                println!("This wallet is not eligible for holder items.");
            }
        }
        WalletCommand::Disconnect => {
            if wallet::disconnect_wallet(store, user_id, now)? {
                println!("Wallet disconnected.");
            } else {
                println!("No wallet was connected.");
            }
        }
    }
    Ok(())
}

// ============================================
// Dashboard
// ============================================

fn cmd_dashboard(
    store: &dyn Store,
    config: &Config,
    user_id: &str,
    json: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let dash = Dashboard::build(store, user_id, now).context("failed to build dashboard")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dash)?);
        return Ok(());
    }

    let name = dash
        .display_name
        .as_deref()
        .or(config.user.display_name.as_deref())
        .unwrap_or(&dash.user_id);
    println!("{}", name);
    println!(
        "Streak: {} days (longest {}, {} practices)",
        dash.streak.current, dash.streak.longest, dash.streak.total_practices
    );
    match &dash.today.card {
        Some(card) if dash.today.completed => println!("Today: {} ✓", card.title),
        Some(card) => println!("Today: {} (not reflected yet)", card.title),
        None => println!("Today: no card pulled"),
    }
    match &dash.pet {
        Some(pet) => println!(
            "Pet: {} the {} is {} (harmony {})",
            pet.name, pet.stage_name, pet.emotion, pet.harmony
        ),
        None => println!("Pet: not hatched yet"),
    }
    for (game, best) in &dash.best_scores {
        match best {
            Some(score) => println!("{}: best {}", game.display_name(), score.score),
            None => println!("{}: not played", game.display_name()),
        }
    }
    match dash.mood.dominant {
        Some(mood) => println!(
            "Mood this week: mostly {} {} ({} check-ins)",
            mood.emoji(),
            mood,
            dash.mood.pulses
        ),
        None => println!("Mood this week: no check-ins"),
    }
    if let Some(wallet) = &dash.wallet {
        println!("Wallet: {}", wallet);
    }
    Ok(())
}
