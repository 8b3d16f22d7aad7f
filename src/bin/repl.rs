use roll20_dice::{DiceRoller, MarkdownStringifier};
use std::io::{self, BufRead, Write};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut roller = DiceRoller::default();
    let mut stringifier = MarkdownStringifier::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    print!("> ");
    io::stdout().flush()?;
    while let Some(Ok(line)) = lines.next() {
        let line = line.trim();
        if !line.is_empty() {
            match roller.roll(line) {
                Ok(r) => println!("{}", stringifier.render(&r)),
                Err(why) => eprintln!("Error: {}", why),
            }
        }
        print!("> ");
        io::stdout().flush()?;
    }
    Ok(())
}
