//! Interactive playground for the accumulation policy.
//! Every line typed is fed to the engine as one recognizer token, the
//! way lines come off the serial device; `:` commands exercise the edit
//! operations instead.

use phrase_engine::{classify, PhraseEngine, SizePolicy, TokenKind, NO_MATCH};
use std::io::{self, Write};

fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║            Phrase Engine Token Playground            ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
    println!("  Each line you type is one device token. A single character");
    println!("  joins the phrase, \"_\" appends a space, empty lines and");
    println!("  \"{}\" are dropped, anything longer is display-only.", NO_MATCH);
    println!();
    println!("  Commands:  :space   :bs   :clear   :quit");
    println!();

    let mut engine = PhraseEngine::new();
    let sizes = SizePolicy::default();

    loop {
        let line = read_line("  token> ");
        let token = line.trim();

        match token {
            ":quit" => {
                println!("\nGoodbye!\n");
                break;
            }
            ":clear" => {
                engine.clear();
                print_state(&engine, &sizes);
                continue;
            }
            ":space" => {
                engine.add_space();
                print_state(&engine, &sizes);
                continue;
            }
            ":bs" => {
                engine.backspace();
                print_state(&engine, &sizes);
                continue;
            }
            _ => {}
        }

        match engine.ingest(token) {
            Some(_) => print_state(&engine, &sizes),
            None => println!("  (dropped {:?})\n", token),
        }
    }
}

fn print_state(engine: &PhraseEngine, sizes: &SizePolicy) {
    let token = engine.current_token();
    if token.is_empty() {
        println!("  current : (none)");
    } else {
        let kind = match classify(token) {
            TokenKind::Rejected => "rejected",
            TokenKind::Space => "space marker",
            TokenKind::Letter(_) => "letter",
            TokenKind::DisplayOnly => "display-only",
        };
        println!("  current : {:?}  ({}, size {})", token, kind, sizes.size_for(token));
    }
    println!("  phrase  : {:?}", engine.phrase());
    println!();
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
