use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use turtox::ast::{NodeId, ProgramTree};
use turtox::executor::{Executor, StdioContext};
use turtox::token::{Token, TokenKind};
use turtox::value::Value;

#[derive(Debug, Parser)]
#[command(version, about = "Stepped execution engine for a turtle graphics language")]
struct CLArgs {
    #[command(subcommand)]
    command: TurtoxCommand,
}

#[derive(Debug, Subcommand)]
enum TurtoxCommand {
    /// Run a canned demo program, echoing every effect to stdout.
    Demo {
        #[arg(value_enum)]
        program: DemoProgram,
        /// Seed for the `random` command.
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DemoProgram {
    /// A square drawn by a learned function.
    Square,
    /// A spiral drawn by a for-loop.
    Spiral,
    /// Random pen strokes with a short wait between them.
    Scatter,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = CLArgs::parse();
    match args.command {
        TurtoxCommand::Demo { program, seed } => {
            let tree = match program {
                DemoProgram::Square => build_square(),
                DemoProgram::Spiral => build_spiral(),
                DemoProgram::Scatter => build_scatter(),
            };
            let mut executor = match seed {
                Some(seed) => Executor::with_seed(tree, seed),
                None => Executor::new(tree),
            };
            let mut context = StdioContext::new();
            loop {
                executor.run(&mut context);
                if executor.is_finished() {
                    break;
                }
                // Suspended without a pending wait means the host gave up.
                match context.take_pending_wait() {
                    Some(seconds) => {
                        std::thread::sleep(std::time::Duration::from_secs_f64(seconds));
                        executor.resume();
                    }
                    None => break,
                }
            }
        }
    }
    Ok(())
}

fn number(tree: &mut ProgramTree, parent: NodeId, value: f64) -> NodeId {
    tree.attach_literal(
        parent,
        Token::word(TokenKind::Number, value.to_string()),
        Value::Number(value),
    )
}

/// learn square $size { repeat 4 { forward $size  turnleft 90 } }
/// square 50
fn build_square() -> ProgramTree {
    let mut tree = ProgramTree::new();
    let root = tree.root();
    let learn = tree.attach(root, Token::word(TokenKind::Learn, "learn"));
    tree.attach(learn, Token::word(TokenKind::Unknown, "square"));
    let parameters = tree.attach(learn, Token::word(TokenKind::ArgumentList, ""));
    tree.attach(parameters, Token::word(TokenKind::Variable, "$size"));
    let body = tree.attach(learn, Token::word(TokenKind::Scope, "{"));
    let repeat = tree.attach(body, Token::word(TokenKind::Repeat, "repeat"));
    number(&mut tree, repeat, 4.0);
    let block = tree.attach(repeat, Token::word(TokenKind::Scope, "{"));
    let forward = tree.attach(block, Token::word(TokenKind::Forward, "forward"));
    tree.attach(forward, Token::word(TokenKind::Variable, "$size"));
    let turn = tree.attach(block, Token::word(TokenKind::TurnLeft, "turnleft"));
    number(&mut tree, turn, 90.0);
    let call = tree.attach(root, Token::word(TokenKind::FunctionCall, "square"));
    number(&mut tree, call, 50.0);
    tree
}

/// for $i = 1 to 20 { forward $i * 5  turnright 92 }
fn build_spiral() -> ProgramTree {
    let mut tree = ProgramTree::new();
    let root = tree.root();
    let for_to = tree.attach(root, Token::word(TokenKind::ForTo, "for"));
    tree.attach(for_to, Token::word(TokenKind::Variable, "$i"));
    number(&mut tree, for_to, 1.0);
    number(&mut tree, for_to, 20.0);
    let block = tree.attach(for_to, Token::word(TokenKind::Scope, "{"));
    let forward = tree.attach(block, Token::word(TokenKind::Forward, "forward"));
    let product = tree.attach(forward, Token::word(TokenKind::Multiplication, "*"));
    tree.attach(product, Token::word(TokenKind::Variable, "$i"));
    number(&mut tree, product, 5.0);
    let turn = tree.attach(block, Token::word(TokenKind::TurnRight, "turnright"));
    number(&mut tree, turn, 92.0);
    tree
}

/// repeat 8 { go random 0 100, random 0 100  forward 10  wait 0.05 }
fn build_scatter() -> ProgramTree {
    let mut tree = ProgramTree::new();
    let root = tree.root();
    let repeat = tree.attach(root, Token::word(TokenKind::Repeat, "repeat"));
    number(&mut tree, repeat, 8.0);
    let block = tree.attach(repeat, Token::word(TokenKind::Scope, "{"));
    let go = tree.attach(block, Token::word(TokenKind::Go, "go"));
    for _ in 0..2 {
        let random = tree.attach(go, Token::word(TokenKind::Random, "random"));
        number(&mut tree, random, 0.0);
        number(&mut tree, random, 100.0);
    }
    let forward = tree.attach(block, Token::word(TokenKind::Forward, "forward"));
    number(&mut tree, forward, 10.0);
    let wait = tree.attach(block, Token::word(TokenKind::Wait, "wait"));
    number(&mut tree, wait, 0.05);
    tree
}
