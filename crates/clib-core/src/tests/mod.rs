//! Crate-level integration and BDD tests.

use crate::engine::{Engine, EngineOptions};
use crate::error::ActionError;
use crate::extension::{ExtensionRegistry, FnLibrary};


/// Registry with the extensions the behaviour scenarios talk to.
fn scenario_registry() -> ExtensionRegistry {
    let mut registry = ExtensionRegistry::new();
    registry
        .register(
            FnLibrary::new("MyExt")
                .with_action("MyAction", |data| Ok(format!("{data} world")))
                .with_action("World", |_| Ok("world".to_owned()))
                .with_action("Repeat", |data| {
                    let count = data.parse::<usize>().map_err(|error| ActionError::Failed {
                        message: error.to_string(),
                    })?;
                    Ok("ab✓".repeat(count))
                }),
        )
        .expect("register MyExt");
    registry
}

#[test]
fn end_to_end_engine_round_trip() {
    let mut engine = Engine::with_options(scenario_registry(), EngineOptions::default());
    let reply = engine.invoke("\u{1}-1\u{1f}MyExt\u{1f}Repeat\u{2}2\u{3}", 64);
    assert_eq!(reply, "\u{2}ab✓ab✓\u{4}");
}
