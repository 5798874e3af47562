use nolan_data::{ErrorKind, LOOP, ONCE, Phase, RouteNode, Tape, validate_tape};
use nolan_script::{Part, compile_script};

fn kingquest() -> Tape {
    let compiled = compile_script(include_str!("fixtures/kingquest.nolan")).expect("kingquest compiles");
    assert_eq!(compiled.tapes.len(), 1);
    compiled.tapes.into_iter().next().unwrap()
}

fn route<'a>(tape: &'a Tape, name: &str) -> &'a RouteNode {
    tape.text.route(name).unwrap_or_else(|| panic!("route '{name}' exists"))
}

#[test]
fn kingquest_initial_state() {
    let tape = kingquest();
    assert_eq!(tape.label, "KINGQUEST");
    assert_eq!(
        tape.initial_state.canonical(),
        "== [CAVE, castle;dragon] [HOME, door;hero;king] [LOOP, TALK-2-0_0]"
    );
    assert!(tape.initial_state.tags(ONCE).is_none());
}

#[test]
fn kingquest_rulebook() {
    let tape = kingquest();
    let heads: Vec<String> = tape.rules.iter().map(ToString::to_string).collect();
    assert_eq!(
        heads,
        [
            "++ ()-[?hero]->()",
            "++ ()-[?hero.sword]->()",
            "++ ()-[?door<CAVE>]->()",
            "++ (dragon<CAVE>)-{hero}[?door<CAVE>]->(dragon.fire<CAVE>;hero.fire<CAVE>)",
            "++ ()-[?castle<HOME>]->()",
            "++ (!hero.sword;!sword)-[?king]->()",
            "++ (?sword)-[?king]->()",
            "++ (?hero.sword)-[?king]->()",
        ]
    );

    let texts: Vec<Option<&str>> = tape.rules.iter().map(|r| r.text.as_deref()).collect();
    assert_eq!(
        texts,
        [
            Some("HELLO"),
            Some("QUEST"),
            None,
            None,
            None,
            Some("TALK"),
            Some("THANK"),
            Some("WORRY"),
        ]
    );
    assert!(!tape.rules[3].drag);
    assert_eq!(tape.rules[3].cost.to_string(), "hero");
}

#[test]
fn kingquest_text_lines() {
    let tape = kingquest();
    let lines = &tape.text.lines;
    let expected: &[(&str, &[&str])] = &[
        ("HELLO", &["Hello World"]),
        ("QUEST", &["I Love King Quest"]),
        ("TALK", &["Accepterez-vous ma quête preu chevalier?"]),
        ("THANK", &["Merci mon valeureux ...", "et bonne chance!"]),
        ("TALK-1S", &["Oui."]),
        ("TALK-1", &["Oui votre majesté."]),
        ("TALK-2S", &["Peut-être?"]),
        ("TALK-2", &["Ça dépend, c'est quoi?"]),
        ("TALK-2-0", &["Libérez le royaume du dragon.", "Tuez la bête."]),
        ("TALK-2-1S", &["Oui."]),
        ("TALK-2-1", &["Oui mais j'ai besoin d'une arme."]),
        ("TALK-2-1-0", &["Prenez l'épée royale mon brave."]),
        ("TALK-2-2S", &["Non!"]),
        ("TALK-2-2", &["Non, je suis contre la cruauté animale."]),
        ("TALK-3S", &["Non!"]),
        ("TALK-3", &["Non, merci."]),
        ("WORRY", &["Restez prudent avec ça.", "Ça a déjà coupé des têtes!"]),
    ];
    for (name, text) in expected {
        let actual = lines.get(*name).unwrap_or_else(|| panic!("text '{name}' exists"));
        assert_eq!(actual, text, "{name}");
    }
    assert_eq!(lines.len(), expected.len());
    assert_eq!(tape.text.line("THANK_1").unwrap(), "et bonne chance!");
}

#[test]
fn kingquest_route_graph() {
    let tape = kingquest();
    assert_eq!(tape.text.routes.len(), 6);

    let talk = route(&tape, "TALK");
    assert_eq!(talk.text, ["TALK"]);
    assert!(talk.goto.is_none());
    let flow: Vec<(&str, &str, String)> = talk
        .flow
        .iter()
        .map(|s| (s.choice.as_str(), s.next.as_str(), s.payload.to_string()))
        .collect();
    assert_eq!(
        flow,
        [
            ("TALK-1S", "TALK-1", "sword".to_string()),
            ("TALK-2S", "TALK-2", String::new()),
            ("TALK-3S", "TALK-3", String::new()),
        ]
    );

    let yes = route(&tape, "TALK-1");
    assert_eq!(yes.text, ["TALK-1"]);
    assert!(yes.flow.is_empty());
    assert_eq!(yes.goto.as_deref(), Some("THANK"));

    let maybe = route(&tape, "TALK-2");
    assert_eq!(maybe.text, ["TALK-2-0", "TALK-2"]);
    let flow: Vec<(&str, &str, String)> = maybe
        .flow
        .iter()
        .map(|s| (s.choice.as_str(), s.next.as_str(), s.payload.to_string()))
        .collect();
    assert_eq!(
        flow,
        [
            ("TALK-2-1S", "TALK-2-1", "sword".to_string()),
            ("TALK-2-2S", "TALK-2-2", String::new()),
        ]
    );

    let weapon = route(&tape, "TALK-2-1");
    assert_eq!(weapon.text, ["TALK-2-1-0", "TALK-2-1"]);
    assert_eq!(weapon.goto.as_deref(), Some("THANK"));

    for terminal in ["TALK-2-2", "TALK-3"] {
        let node = route(&tape, terminal);
        assert_eq!(node.text, [terminal]);
        assert!(node.is_terminal(), "{terminal}");
    }
}

#[test]
fn kingquest_validates_and_lists_parts() {
    let source = include_str!("fixtures/kingquest.nolan");
    let compiled = compile_script(source).unwrap();
    assert!(validate_tape(&compiled.tapes[0]).is_empty());

    assert!(matches!(compiled.parts[&1], Part::Comment(_)));
    assert_eq!(compiled.parts[&2], Part::StateDecl("KINGQUEST".into()));
    assert_eq!(compiled.parts[&12], Part::Route("TALK".into()));
    let rules = compiled.parts.values().filter(|p| matches!(p, Part::Rule(_))).count();
    assert_eq!(rules, 8);

    for value in ["castle", "dragon.fire", "hero.sword", "sword", "king"] {
        assert!(compiled.registry.contains(value), "{value}");
    }
    assert!(!compiled.registry.contains("TALK-2-0_0"));
}

#[test]
fn bof_once_sequence() {
    let compiled = compile_script(include_str!("fixtures/bof.nolan")).unwrap();
    let tape = compiled.tape("bof").expect("tape BOF");
    assert_eq!(tape.initial_state.canonical(), "== [HOME, hero;king] [ONCE, TALK_0]");
    assert!(tape.initial_state.tags(LOOP).is_none());
    assert_eq!(tape.rules.len(), 1);
    assert_eq!(tape.rules[0].to_string(), "++ (?hero)-[?king]->()");
    assert_eq!(tape.rules[0].text.as_deref(), Some("TALK"));
    assert_eq!(
        tape.text.lines["TALK"],
        [
            "Accepterez-vous ma quête preu chevalier?",
            "Sauverez-vous le royaume mon ami?"
        ]
    );
}

#[test]
fn compiled_tape_survives_a_file_round_trip() {
    let tape = kingquest();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("KINGQUEST.json");
    std::fs::write(&path, serde_json::to_string_pretty(&tape).unwrap()).unwrap();
    let back: Tape = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(back, tape);
    assert_eq!(back.rules[5].text.as_deref(), Some("TALK"));
}

#[test]
fn skipped_indentation_is_a_route_error() {
    let script = "\
== A [HOME, king]
++ ()-[?king]->() #TALK Hi
-- [Yes] please.
---- [Too deep] indeed.
";
    let err = compile_script(script).unwrap_err();
    assert_eq!(err.kind, ErrorKind::SyntaxError);
    assert_eq!(err.phase, Phase::Route);
    assert!(err.message.starts_with("line 4:"), "{}", err.message);
}

#[test]
fn route_must_open_with_a_choice() {
    let script = "\
== A [HOME, king]
++ ()-[?king]->() #TALK Hi
--> THANK
";
    let err = compile_script(script).unwrap_err();
    assert_eq!(err.kind, ErrorKind::OutOfRange);
    assert!(err.message.starts_with("line 3:"), "{}", err.message);
}

#[test]
fn duplicate_route_node_is_rejected() {
    let script = "\
== A [HOME, king]
++ ()-[?king]->() #TALK Hi
-- [Yes] please.
++ ()-[?king]->() #TALK-1 Again
-- [No] thanks.
";
    let err = compile_script(script).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateKey);
    assert_eq!(err.phase, Phase::Route);
}
