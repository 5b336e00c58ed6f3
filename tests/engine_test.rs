mod common;

use common::{
    assign, boolean, call, fault_code, learn, number, run, run_seeded, scope, string, variable,
    word,
};
use compact_str::CompactString;
use turtox::ast::ProgramTree;
use turtox::executor::{Action, Executor, RecordingContext};
use turtox::token::TokenKind;
use turtox::value::Value;

#[test]
fn empty_program_finishes_immediately() {
    let (executor, context) = run(ProgramTree::new());
    assert!(executor.is_finished());
    assert!(context.actions().is_empty());
    assert!(context.errors().is_empty());
}

#[test]
fn statements_execute_in_order() {
    let mut tree = ProgramTree::new();
    let root = tree.root();
    let forward = word(&mut tree, root, TokenKind::Forward, "forward");
    number(&mut tree, forward, 10.0);
    let turn = word(&mut tree, root, TokenKind::TurnLeft, "turnleft");
    number(&mut tree, turn, 90.0);
    let (_, context) = run(tree);
    assert_eq!(
        context.actions(),
        &[Action::Forward(10.0), Action::TurnLeft(90.0)]
    );
}

#[test]
fn bare_scope_runs_its_children() {
    // { forward 5 }  forward 7
    let mut tree = ProgramTree::new();
    let root = tree.root();
    let block = scope(&mut tree, root);
    let inner = word(&mut tree, block, TokenKind::Forward, "forward");
    number(&mut tree, inner, 5.0);
    let after = word(&mut tree, root, TokenKind::Forward, "forward");
    number(&mut tree, after, 7.0);

    let (executor, context) = run(tree);
    assert!(executor.is_finished());
    assert!(context.errors().is_empty());
    assert_eq!(context.actions(), &[Action::Forward(5.0), Action::Forward(7.0)]);
}

#[test]
fn nested_bare_scopes_run_once_each() {
    // { { forward 1 } forward 2 }
    let mut tree = ProgramTree::new();
    let root = tree.root();
    let outer = scope(&mut tree, root);
    let inner = scope(&mut tree, outer);
    let first = word(&mut tree, inner, TokenKind::Forward, "forward");
    number(&mut tree, first, 1.0);
    let second = word(&mut tree, outer, TokenKind::Forward, "forward");
    number(&mut tree, second, 2.0);

    let (_, context) = run(tree);
    assert_eq!(context.actions(), &[Action::Forward(1.0), Action::Forward(2.0)]);
}

#[test]
fn if_runs_exactly_one_branch() {
    for condition in [true, false] {
        let mut tree = ProgramTree::new();
        let root = tree.root();
        let branch = word(&mut tree, root, TokenKind::If, "if");
        boolean(&mut tree, branch, condition);
        let then_scope = scope(&mut tree, branch);
        let forward = word(&mut tree, then_scope, TokenKind::Forward, "forward");
        number(&mut tree, forward, 1.0);
        let else_scope = scope(&mut tree, branch);
        let backward = word(&mut tree, else_scope, TokenKind::Backward, "backward");
        number(&mut tree, backward, 1.0);
        let (_, context) = run(tree);
        let expected = if condition {
            Action::Forward(1.0)
        } else {
            Action::Backward(1.0)
        };
        assert_eq!(context.actions(), &[expected]);
    }
}

#[test]
fn learned_function_draws_a_square() {
    let mut tree = ProgramTree::new();
    let root = tree.root();
    let body = learn(&mut tree, root, "square", &["$size"]);
    let repeat = word(&mut tree, body, TokenKind::Repeat, "repeat");
    number(&mut tree, repeat, 4.0);
    let block = scope(&mut tree, repeat);
    let forward = word(&mut tree, block, TokenKind::Forward, "forward");
    variable(&mut tree, forward, "$size");
    let turn = word(&mut tree, block, TokenKind::TurnLeft, "turnleft");
    number(&mut tree, turn, 90.0);
    let invocation = call(&mut tree, root, "square");
    number(&mut tree, invocation, 50.0);

    let (executor, context) = run(tree);
    let mut expected = Vec::new();
    for _ in 0..4 {
        expected.push(Action::Forward(50.0));
        expected.push(Action::TurnLeft(90.0));
    }
    assert_eq!(context.actions(), expected.as_slice());
    assert_eq!(executor.call_depth(), 0);
    let expected_events: &[(CompactString, Vec<CompactString>)] =
        &[("square".into(), vec!["$size".into()])];
    assert_eq!(context.function_events(), expected_events);
}

#[test]
fn wrong_arity_call_leaves_stack_untouched() {
    let mut tree = ProgramTree::new();
    let root = tree.root();
    let body = learn(&mut tree, root, "square", &["$size"]);
    let forward = word(&mut tree, body, TokenKind::Forward, "forward");
    variable(&mut tree, forward, "$size");
    call(&mut tree, root, "square");

    let (executor, context) = run(tree);
    assert!(context.actions().is_empty());
    assert_eq!(executor.call_depth(), 0);
    let errors = context.errors().errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, fault_code(TokenKind::FunctionCall, 93));
}

#[test]
fn return_value_reaches_the_call_site() {
    let mut tree = ProgramTree::new();
    let root = tree.root();
    let body = learn(&mut tree, root, "five", &[]);
    let ret = word(&mut tree, body, TokenKind::Return, "return");
    number(&mut tree, ret, 5.0);
    let assignment = assign(&mut tree, root, "$x");
    call(&mut tree, assignment, "five");
    let print = word(&mut tree, root, TokenKind::Print, "print");
    variable(&mut tree, print, "$x");

    let (_, context) = run(tree);
    assert!(context.errors().is_empty());
    assert_eq!(context.actions(), &[Action::Print("5".to_owned())]);
}

#[test]
fn function_with_no_return_yields_the_empty_value() {
    let mut tree = ProgramTree::new();
    let root = tree.root();
    learn(&mut tree, root, "noop", &[]);
    let assignment = assign(&mut tree, root, "$x");
    let minus = word(&mut tree, assignment, TokenKind::Subtraction, "-");
    call(&mut tree, minus, "noop");
    number(&mut tree, minus, 1.0);

    let (_, context) = run(tree);
    let errors = context.errors().errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, fault_code(TokenKind::Subtraction, 91));
}

#[test]
fn function_locals_do_not_leak() {
    let mut tree = ProgramTree::new();
    let root = tree.root();
    let body = learn(&mut tree, root, "setlocal", &[]);
    let local = assign(&mut tree, body, "$y");
    number(&mut tree, local, 1.0);
    call(&mut tree, root, "setlocal");
    let print = word(&mut tree, root, TokenKind::Print, "print");
    variable(&mut tree, print, "$y");

    let (_, context) = run(tree);
    let errors = context.errors().errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, fault_code(TokenKind::Variable, 92));
    // The fault does not stop the statement: print still runs on the
    // empty value.
    assert_eq!(context.actions(), &[Action::Print(String::new())]);
}

#[test]
fn globals_are_visible_inside_functions() {
    let mut tree = ProgramTree::new();
    let root = tree.root();
    let global = assign(&mut tree, root, "$g");
    number(&mut tree, global, 7.0);
    let body = learn(&mut tree, root, "show", &[]);
    let print = word(&mut tree, body, TokenKind::Print, "print");
    variable(&mut tree, print, "$g");
    call(&mut tree, root, "show");

    let (_, context) = run(tree);
    assert!(context.errors().is_empty());
    assert_eq!(context.actions(), &[Action::Print("7".to_owned())]);
}

#[test]
fn unknown_function_is_reported_and_skipped() {
    let mut tree = ProgramTree::new();
    let root = tree.root();
    call(&mut tree, root, "mystery");
    let forward = word(&mut tree, root, TokenKind::Forward, "forward");
    number(&mut tree, forward, 10.0);

    let (executor, context) = run(tree);
    assert!(executor.is_finished());
    let errors = context.errors().errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, fault_code(TokenKind::FunctionCall, 92));
    assert_eq!(context.actions(), &[Action::Forward(10.0)]);
}

#[test]
fn assignment_reads_the_previous_binding() {
    let mut tree = ProgramTree::new();
    let root = tree.root();
    let first = assign(&mut tree, root, "$x");
    number(&mut tree, first, 2.0);
    let second = assign(&mut tree, root, "$x");
    let sum = word(&mut tree, second, TokenKind::Addition, "+");
    variable(&mut tree, sum, "$x");
    number(&mut tree, sum, 3.0);
    let print = word(&mut tree, root, TokenKind::Print, "print");
    variable(&mut tree, print, "$x");

    let (_, context) = run(tree);
    assert!(context.errors().is_empty());
    assert_eq!(context.actions(), &[Action::Print("5".to_owned())]);
    assert_eq!(
        context.variable_events().last(),
        Some(&("$x".into(), Value::Number(5.0)))
    );
}

#[test]
fn single_stepping_matches_a_full_run() {
    let build = || {
        let mut tree = ProgramTree::new();
        let root = tree.root();
        let repeat = word(&mut tree, root, TokenKind::Repeat, "repeat");
        number(&mut tree, repeat, 3.0);
        let block = scope(&mut tree, repeat);
        let forward = word(&mut tree, block, TokenKind::Forward, "forward");
        let random = word(&mut tree, forward, TokenKind::Random, "random");
        number(&mut tree, random, 1.0);
        number(&mut tree, random, 100.0);
        tree
    };

    let (_, full) = run_seeded(build(), 42);

    let mut executor = Executor::with_seed(build(), 42);
    let mut stepped = RecordingContext::new();
    while !executor.is_finished() {
        executor.step(&mut stepped);
    }
    assert_eq!(stepped.actions(), full.actions());
    assert_eq!(stepped.highlights(), full.highlights());
}

#[test]
fn seeded_random_is_deterministic() {
    let build = || {
        let mut tree = ProgramTree::new();
        let root = tree.root();
        let assignment = assign(&mut tree, root, "$x");
        let random = word(&mut tree, assignment, TokenKind::Random, "random");
        number(&mut tree, random, 1.0);
        number(&mut tree, random, 10.0);
        let print = word(&mut tree, root, TokenKind::Print, "print");
        variable(&mut tree, print, "$x");
        tree
    };
    let (_, first) = run_seeded(build(), 7);
    let (_, second) = run_seeded(build(), 7);
    assert_eq!(first.actions(), second.actions());
}

#[test]
fn random_stays_within_its_bounds() {
    for seed in 0..20 {
        let mut tree = ProgramTree::new();
        let root = tree.root();
        let forward = word(&mut tree, root, TokenKind::Forward, "forward");
        let random = word(&mut tree, forward, TokenKind::Random, "random");
        number(&mut tree, random, 5.0);
        number(&mut tree, random, 6.0);
        let (_, context) = run_seeded(tree, seed);
        match context.actions() {
            [Action::Forward(distance)] => {
                assert!((5.0..6.0).contains(distance), "{distance} out of bounds")
            }
            other => panic!("unexpected actions {other:?}"),
        }
    }
}

#[test]
fn ask_replies_stay_strings() {
    // $x = ask "how far?"  print $x  forward $x
    let mut tree = ProgramTree::new();
    let root = tree.root();
    let assignment = assign(&mut tree, root, "$x");
    let ask = word(&mut tree, assignment, TokenKind::Ask, "ask");
    string(&mut tree, ask, "how far?");
    let print = word(&mut tree, root, TokenKind::Print, "print");
    variable(&mut tree, print, "$x");
    let forward = word(&mut tree, root, TokenKind::Forward, "forward");
    variable(&mut tree, forward, "$x");

    let mut executor = Executor::with_seed(tree, 0);
    let mut context = RecordingContext::new();
    context.set_ask_reply("7");
    executor.run(&mut context);
    assert_eq!(
        context.actions(),
        &[Action::Ask("how far?".to_owned()), Action::Print("7".to_owned())]
    );
    // The reply is a string, so number-typed commands refuse it.
    let errors = context.errors().errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, fault_code(TokenKind::Forward, 91));
}

#[test]
fn highlight_reports_every_evaluated_node() {
    let mut tree = ProgramTree::new();
    let root = tree.root();
    let forward = word(&mut tree, root, TokenKind::Forward, "forward");
    number(&mut tree, forward, 10.0);
    let (_, context) = run(tree);
    // The literal and the command, nothing for root.
    assert_eq!(context.highlights().len(), 2);
}
