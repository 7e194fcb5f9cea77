//! The cdb command line: create, ingest, export and inspect chess game databases
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
#![warn(unused_extern_crates)]

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;

use clap::{crate_version, App, Arg, ArgMatches, SubCommand};
use log::warn;
use simplelog::{Config, LevelFilter, SimpleLogger, WriteLogger};

use cdb::db::{codec, Database, OpenOptions, HEADER_SIZE, PAGE_SIZE};
use cdb::error::{CoreError, Error};
use cdb::pgn;
use cdb::pool::ThreadPool;
use chess::{perft, to_san, GameResult, Position};

fn main() {
    let matches =
        App::new("cdb")
            .version(crate_version!())
            .about("A chess game database over PGN archives")
            .arg(Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .global(true)
                .help("Increases the log level; may be repeated"))
            .arg(Arg::with_name("log-file")
                .long("log-file")
                .value_name("LOG_FILE")
                .takes_value(true)
                .global(true)
                .help("Writes the log to a file instead of stderr"))
            .subcommand(SubCommand::with_name("create")
                .about("Creates an empty database file")
                .arg(Arg::with_name("db")
                    .value_name("DB_FILE")
                    .required(true)
                    .help("Path of the database to create"))
                .arg(Arg::with_name("size-mb")
                    .long("size-mb")
                    .value_name("MB")
                    .takes_value(true)
                    .default_value("64")
                    .help("Size of the game arena in mebibytes"))
                .arg(Arg::with_name("name")
                    .long("name")
                    .value_name("NAME")
                    .takes_value(true)
                    .default_value("")
                    .help("Name recorded in the database header")))
            .subcommand(SubCommand::with_name("ingest")
                .about("Parses PGN files and stores their games")
                .arg(Arg::with_name("db")
                    .value_name("DB_FILE")
                    .required(true)
                    .help("Database to ingest into; created if absent"))
                .arg(Arg::with_name("pgn")
                    .value_name("PGN_FILE")
                    .required(true)
                    .multiple(true)
                    .help("PGN files to read"))
                .arg(Arg::with_name("skip-errors")
                    .long("skip-errors")
                    .help("Skips malformed games instead of stopping at the first"))
                .arg(Arg::with_name("jobs")
                    .long("jobs")
                    .short("j")
                    .value_name("N")
                    .takes_value(true)
                    .default_value("1")
                    .help("Worker threads for parsing multiple files")))
            .subcommand(SubCommand::with_name("export")
                .about("Writes the stored games back out as PGN")
                .arg(Arg::with_name("db")
                    .value_name("DB_FILE")
                    .required(true)
                    .help("Database to export"))
                .arg(Arg::with_name("out")
                    .long("out")
                    .short("o")
                    .value_name("PGN_FILE")
                    .takes_value(true)
                    .help("Output file; stdout if omitted")))
            .subcommand(SubCommand::with_name("list")
                .about("Prints the header and a per-game summary")
                .arg(Arg::with_name("db")
                    .value_name("DB_FILE")
                    .required(true)
                    .help("Database (or raw PGN file) to inspect")))
            .subcommand(SubCommand::with_name("counts")
                .about("Counts the number of variations from a given starting position \
                        to a specified\ndepth. Defaults to the standard starting position.")
                .arg(Arg::with_name("depth")
                    .long("depth")
                    .short("d")
                    .value_name("DEPTH")
                    .takes_value(true)
                    .required(true)
                    .help("Depth to search the position"))
                .arg(Arg::with_name("fen")
                    .value_name("FEN_STRING")
                    .default_value("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
                    .hide_default_value(true)
                    .multiple(true)
                    .help("Position to search in Forsyth-Edwards Notation (FEN)")))
            .get_matches();

    let level = match matches.occurrences_of("verbose") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let logger = match matches.value_of_os("log-file") {
        Some(path) => match File::create(path) {
            Ok(file) => WriteLogger::init(level, Config::default(), file),
            Err(err) => {
                eprintln!("{}: {}", path.to_string_lossy(), err);
                SimpleLogger::init(level, Config::default())
            }
        },
        None => SimpleLogger::init(level, Config::default()),
    };
    if let Err(err) = logger {
        eprintln!("logging disabled: {}", err);
    }

    if let Err(error) = run(&matches) {
        eprintln!("error: {}", error);
        process::exit(error.exit_code());
    }
}

fn run(matches: &ArgMatches<'_>) -> cdb::Result<()> {
    match matches.subcommand() {
        ("create", Some(matches)) => create(matches),
        ("ingest", Some(matches)) => ingest(matches),
        ("export", Some(matches)) => export(matches),
        ("list", Some(matches)) => list(matches),
        ("counts", Some(matches)) => counts(matches),
        _ => {
            println!("{}", matches.usage());
            Ok(())
        }
    }
}

fn numeric<T: std::str::FromStr>(matches: &ArgMatches<'_>, name: &str) -> cdb::Result<T> {
    matches
        .value_of(name)
        .expect("INFALLIBLE")
        .parse()
        .map_err(|_| Error::Core(CoreError::OutOfRange))
}

fn create(matches: &ArgMatches<'_>) -> cdb::Result<()> {
    let path = PathBuf::from(matches.value_of_os("db").expect("INFALLIBLE"));
    let size_mb: usize = numeric(matches, "size-mb")?;

    let options = OpenOptions {
        create: true,
        size: HEADER_SIZE + size_mb * 1024 * 1024,
        name: matches.value_of("name").unwrap_or("").to_string(),
        ..OpenOptions::default()
    };

    let db = Database::create(&path, &options)?;
    println!("created {} ({} MiB arena)", path.display(), size_mb);
    db.close()
}

// one game's compact encoding, ready for the page allocator
struct EncodedGame {
    tags: Vec<u8>,
    moves: Vec<u8>,
}

// parse a PGN buffer into encoded games; returns (games, parse errors, skipped games)
fn encode_file(data: &str, skip_errors: bool) -> (Vec<EncodedGame>, usize, usize) {
    use std::cell::RefCell;

    let games = RefCell::new(Vec::new());
    let current = RefCell::new(EncodedGame { tags: Vec::new(), moves: Vec::new() });
    // games whose encoding fails (custom starting position, unencodable move) are dropped
    let broken = RefCell::new(false);
    let errors = RefCell::new(0usize);
    let skipped = RefCell::new(0usize);

    pgn::parse_games(
        data,
        |name, value| {
            if name == "FEN" {
                // the compact tag set cannot record a custom starting position
                *broken.borrow_mut() = true;
            }
            codec::write_tag(
                &mut current.borrow_mut().tags,
                codec::TagId::from_name(name),
                value.as_bytes(),
            );
        },
        |step| {
            let mut current = current.borrow_mut();
            if codec::encode_move_index(&mut current.moves, &step.prev, &step.mv).is_err() {
                *broken.borrow_mut() = true;
            }
        },
        |_result| {
            let mut current = current.borrow_mut();
            let mut game = EncodedGame {
                tags: std::mem::replace(&mut current.tags, Vec::new()),
                moves: std::mem::replace(&mut current.moves, Vec::new()),
            };

            if *broken.borrow() {
                *broken.borrow_mut() = false;
                *skipped.borrow_mut() += 1;
                return;
            }
            if !game.tags.is_empty() {
                codec::finish_tags(&mut game.tags);
            }
            games.borrow_mut().push(game);
        },
        |err| {
            warn!("pgn: {}", err);
            *errors.borrow_mut() += 1;

            let mut current = current.borrow_mut();
            current.tags.clear();
            current.moves.clear();
            *broken.borrow_mut() = false;
        },
        skip_errors,
    );

    (games.into_inner(), errors.into_inner(), skipped.into_inner())
}

fn ingest(matches: &ArgMatches<'_>) -> cdb::Result<()> {
    let db_path = PathBuf::from(matches.value_of_os("db").expect("INFALLIBLE"));
    let paths: Vec<PathBuf> = matches
        .values_of_os("pgn")
        .expect("INFALLIBLE")
        .map(PathBuf::from)
        .collect();
    let skip_errors = matches.is_present("skip-errors");
    let jobs: usize = numeric(matches, "jobs")?;

    let mut db = if db_path.exists() {
        Database::open(&db_path, &OpenOptions::default())?
    } else {
        let total: usize = paths
            .iter()
            .filter_map(|p| fs::metadata(p).ok())
            .map(|m| m.len() as usize)
            .sum();

        Database::create(&db_path, &OpenOptions {
            create: true,
            size: HEADER_SIZE + PAGE_SIZE + 2 * total,
            ..OpenOptions::default()
        })?
    };

    let mut stored = 0u64;
    let mut errors = 0usize;
    let mut skipped = 0usize;

    let store = |db: &mut Database, games: Vec<EncodedGame>| -> cdb::Result<u64> {
        let mut stored = 0;
        for game in games {
            db.add_game(&game.tags, &game.moves)?;
            stored += 1;
        }
        Ok(stored)
    };

    if jobs > 1 && paths.len() > 1 {
        // files parse in parallel; a single writer keeps the arena consistent
        let pool = ThreadPool::new(jobs);
        let (tx, rx) = mpsc::channel();

        for path in &paths {
            let tx = tx.clone();
            let path = path.clone();
            pool.execute(move || {
                let outcome = fs::read(&path)
                    .map(|bytes| encode_file(&String::from_utf8_lossy(&bytes), skip_errors));
                tx.send((path, outcome)).expect("INFALLIBLE");
            });
        }
        drop(tx);

        for (path, outcome) in rx.iter() {
            match outcome {
                Ok((games, errs, skips)) => {
                    stored += store(&mut db, games)?;
                    errors += errs;
                    skipped += skips;
                }
                Err(err) => {
                    warn!("{}: {}", path.display(), err);
                    errors += 1;
                }
            }
        }
    } else {
        for path in &paths {
            let bytes = fs::read(path)?;
            let (games, errs, skips) = encode_file(&String::from_utf8_lossy(&bytes), skip_errors);
            stored += store(&mut db, games)?;
            errors += errs;
            skipped += skips;
        }
    }

    db.flush()?;
    println!(
        "{} games stored, {} parse errors, {} games skipped",
        stored, errors, skipped
    );
    db.close()
}

fn export(matches: &ArgMatches<'_>) -> cdb::Result<()> {
    let path = PathBuf::from(matches.value_of_os("db").expect("INFALLIBLE"));
    let db = Database::open(&path, &OpenOptions::default())?;

    let mut out: Box<dyn Write> = match matches.value_of_os("out") {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(std::io::stdout()),
    };

    if db.is_pgn() {
        out.write_all(db.pgn_bytes())?;
        return Ok(());
    }

    for game in db.games() {
        let mut tags = Vec::new();
        codec::parse_tags(game.tags, |id, value| tags.push((id, value)))?;

        let mut result = GameResult::Unknown;
        for &(id, value) in &tags {
            writeln!(out, "[{} \"{}\"]", id.name(), String::from_utf8_lossy(value))?;
            if id == codec::TagId::Result {
                result = match value {
                    b"1-0" => GameResult::White,
                    b"0-1" => GameResult::Black,
                    b"1/2-1/2" => GameResult::Draw,
                    _ => GameResult::Incomplete,
                };
            }
        }
        writeln!(out)?;

        let mut sans = Vec::new();
        codec::decode_moves_indexed(game.moves, Position::STARTPOS, |prev, mv, _| {
            let black = sans.len() % 2 == 1;
            sans.push(to_san(mv, prev, black));
        })?;

        let mut line = String::new();
        for (i, san) in sans.iter().enumerate() {
            if i % 2 == 0 {
                line += &format!("{}. ", i / 2 + 1);
            }
            line += san;
            line.push(' ');
        }
        line += &result.to_string();
        writeln!(out, "{}", line)?;
        writeln!(out)?;
    }

    Ok(())
}

fn list(matches: &ArgMatches<'_>) -> cdb::Result<()> {
    let path = PathBuf::from(matches.value_of_os("db").expect("INFALLIBLE"));
    let db = Database::open(&path, &OpenOptions::default())?;

    if db.is_pgn() {
        // a raw PGN has no header; count its games instead
        let data = String::from_utf8_lossy(db.pgn_bytes()).into_owned();
        let mut moves = 0usize;
        let games = pgn::parse_games(&data, |_, _| {}, |_| moves += 1, |_| {}, |_| {}, true);
        println!("raw pgn:  {}", path.display());
        println!("games:    {}", games);
        println!("moves:    {}", moves);
        return Ok(());
    }

    let header = db.header();
    println!("name:          {}", header.name);
    println!("version:       {}", header.version);
    println!("games:         {}", db.game_count());
    println!("data offset:   {}", header.data_offset);
    println!("data length:   {}", header.data_length);
    println!("data checksum: {:016x}", header.data_checksum);

    for game in db.games() {
        let mut white = String::from("?");
        let mut black = String::from("?");
        let mut result = String::from("*");

        codec::parse_tags(game.tags, |id, value| {
            let value = String::from_utf8_lossy(value).into_owned();
            match id {
                codec::TagId::White => white = value,
                codec::TagId::Black => black = value,
                codec::TagId::Result => result = value,
                _ => {}
            }
        })?;

        println!("{:016x}  {} - {}  {}", game.hash, white, black, result);
    }

    Ok(())
}

fn counts(matches: &ArgMatches<'_>) -> cdb::Result<()> {
    let depth: usize = numeric(matches, "depth")?;

    for fen in matches.values_of("fen").expect("INFALLIBLE") {
        let (pos, _) = Position::from_fen(fen).map_err(Error::from)?;

        println!("\n{}", fen);
        let count = perft(&pos, depth);
        println!("Depth {} total:\t{:12}", depth, count);
    }

    Ok(())
}
