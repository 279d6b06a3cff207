use std::fs;
use std::io::{self, Read};

use anyhow::{anyhow, bail, Context};
use clap::{crate_version, App, Arg};
use log::{info, LevelFilter};
use plang::{diagnostic, Lexer, Parser, ParserError, PrecedenceTable, Token};

fn parse_operator(binding: &str) -> anyhow::Result<(char, u32)> {
    let (op, precedence) = binding
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("expected OP=PRECEDENCE, found '{}'", binding))?;
    let mut chars = op.chars();
    let op = match (chars.next(), chars.next()) {
        (Some(op), None) => op,
        _ => bail!("operator must be a single character, found '{}'", op),
    };
    let precedence = precedence
        .parse::<u32>()
        .with_context(|| format!("invalid precedence for '{}'", op))?;
    Ok((op, precedence))
}

fn read_source(path: Option<&str>) -> anyhow::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {}", path)),
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("failed to read standard input")?;
            Ok(source)
        }
    }
}

fn report(source: &str, err: &ParserError) {
    eprintln!("{}", diagnostic::render(source, err.span(), &err.to_string()));
}

fn dump_tokens(source: &str) -> anyhow::Result<()> {
    let mut lexer = Lexer::new(source);
    loop {
        let token = lexer.next_token().map_err(|err| {
            eprintln!("{}", diagnostic::render(source, err.span(), &err.to_string()));
            anyhow!("lexing failed")
        })?;
        if token == Token::Eof {
            return Ok(());
        }
        println!("{}\t{}", lexer.token_start(), token);
    }
}

fn main() -> anyhow::Result<()> {
    let matches = App::new("plang")
        .version(crate_version!())
        .about("parses plang source into its syntax tree")
        .arg(
            Arg::with_name("INPUT")
                .help("source file to parse, standard input when omitted")
                .index(1),
        )
        .arg(
            Arg::with_name("operator")
                .short("o")
                .long("operator")
                .value_name("OP=PRECEDENCE")
                .help("registers an extra binary operator")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1),
        )
        .arg(
            Arg::with_name("tokens")
                .long("tokens")
                .help("prints the token stream instead of parsing"),
        )
        .arg(
            Arg::with_name("keep-going")
                .short("k")
                .long("keep-going")
                .help("reports a failed item and continues with the next token"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("raises the log level, repeat for more"),
        )
        .get_matches();

    let level = match matches.occurrences_of("verbose") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let mut precedence = PrecedenceTable::default();
    for binding in matches.values_of("operator").into_iter().flatten() {
        let (op, pr) = parse_operator(binding)?;
        precedence.register(op, pr)?;
        info!("registered operator '{}' with precedence {}", op, pr);
    }

    let source = read_source(matches.value_of("INPUT"))?;

    if matches.is_present("tokens") {
        return dump_tokens(&source);
    }

    let keep_going = matches.is_present("keep-going");
    let mut parser = Parser::new(&source, &precedence).map_err(|err| {
        report(&source, &err);
        anyhow!("parsing failed")
    })?;
    let mut failures = 0;
    loop {
        match parser.parse_item() {
            Ok(Some(node)) => println!("{}", node),
            Ok(None) => break,
            Err(err) => {
                report(&source, &err);
                if !keep_going {
                    bail!("parsing failed");
                }
                failures += 1;
                while let Err(err) = parser.skip_token() {
                    report(&source, &err);
                    failures += 1;
                }
            }
        }
    }

    if failures > 0 {
        bail!("{} item(s) failed to parse", failures);
    }
    Ok(())
}
