//! Built-in extensions the CLI can load by ID.

use std::cell::Cell;
use std::rc::Rc;

use serde_json::json;
use tessera_core::{Ability, BehaviorFactory, ContentType, Listener, System};
use tessera_plugin::{ExtensionContext, ExtensionDescriptor, ExtensionRef, PluginError};

use crate::runtime::{TICKS, TickCounter};

/// A named extension constructor.
pub struct CatalogEntry {
    /// Extension ID, as written in tessera.json.
    pub id: &'static str,

    /// One-line summary shown by `tessera list`.
    pub description: &'static str,

    build: fn() -> ExtensionRef,
}

impl CatalogEntry {
    /// Builds a fresh reference to the extension.
    pub fn reference(&self) -> ExtensionRef {
        (self.build)()
    }
}

/// Every built-in extension.
pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        id: "core.input",
        description: "Samples input and broadcasts it every frame",
        build: input,
    },
    CatalogEntry {
        id: "core.movement",
        description: "Player actor, dash ability, and movement integration",
        build: movement,
    },
    CatalogEntry {
        id: "core.combat",
        description: "Melee and spell abilities with a factory-built AI system",
        build: combat,
    },
    CatalogEntry {
        id: "core.loot",
        description: "Loot drops (constructed lazily)",
        build: loot,
    },
    CatalogEntry {
        id: "demo.unstable",
        description: "Fails halfway through registration to demonstrate rollback",
        build: unstable,
    },
];

/// Looks up a catalog entry by extension ID.
pub fn find(id: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|entry| entry.id == id)
}

/// Wraps a tick function so the runtime's tick counter sees every tick.
fn counted(ctx: &ExtensionContext<'_>, id: &str, mut tick: impl FnMut(f64) + 'static) -> System {
    let counter = ctx.services().get::<TickCounter>(TICKS).cloned();
    let name = id.to_string();
    System::new(id, move |delta| {
        if let Some(counter) = &counter {
            counter.record(&name);
        }
        tick(delta);
    })
}

fn input() -> ExtensionRef {
    ExtensionRef::descriptor(
        ExtensionDescriptor::new("core.input", |ctx| {
            let events = ctx.events().clone();
            let mut frame = 0u64;
            let system = counted(ctx, "input", move |_| {
                frame += 1;
                events.emit("input", &[json!({ "frame": frame, "axis": [1.0, 0.0] })]);
            });
            ctx.add_system(system);
            Ok(())
        })
        .with_version("1.0.0"),
    )
}

fn movement() -> ExtensionRef {
    let distance = Rc::new(Cell::new(0.0_f64));
    let pending = Rc::new(Cell::new(0u32));
    let travelled = Rc::clone(&distance);

    ExtensionRef::descriptor(
        ExtensionDescriptor::new("core.movement", move |ctx| {
            ctx.register_ability(
                Ability::new("dash")
                    .with_name("Dash")
                    .with_cooldown(1.5)
                    .with_params(json!({ "distance": 4.0 })),
            );
            ctx.register_content_type(
                ContentType::new("actor.player", "actor")
                    .with_schema(json!({ "speed": "number", "health": "number" })),
            );

            let inputs = Rc::clone(&pending);
            ctx.events()
                .on("input", Listener::new(move |_| inputs.set(inputs.get() + 1)));

            let inputs = Rc::clone(&pending);
            let distance = Rc::clone(&distance);
            let system = counted(ctx, "movement", move |delta| {
                let steps = inputs.replace(0);
                distance.set(distance.get() + f64::from(steps) * 5.0 * delta);
            });
            ctx.add_system(system);
            Ok(())
        })
        .with_version("1.2.0")
        .with_unregister(move |ctx| {
            tracing::debug!(
                extension = %ctx.extension_id(),
                distance = travelled.get(),
                "player stopped"
            );
            Ok(())
        }),
    )
}

fn combat() -> ExtensionRef {
    ExtensionRef::descriptor(
        ExtensionDescriptor::new("core.combat", |ctx| {
            ctx.register_ability(Ability::new("strike").with_name("Strike").with_cooldown(0.5));
            ctx.register_ability(
                Ability::new("fireball")
                    .with_name("Fireball")
                    .with_cooldown(3.0)
                    .with_params(json!({ "damage": 24, "radius": 2.5 })),
            );
            ctx.register_content_type(ContentType::new("enemy.slime", "enemy"));

            let counter = ctx.services().get::<TickCounter>(TICKS).cloned();
            ctx.register_behavior_factory(
                BehaviorFactory::new("combat.ai", move || {
                    let counter = counter.clone();
                    System::new("combat_ai", move |_| {
                        if let Some(counter) = &counter {
                            counter.record("combat_ai");
                        }
                    })
                })
                .with_description("Chases the nearest player"),
            );
            ctx.spawn_system("combat.ai")?;

            let events = ctx.events().clone();
            let system = counted(ctx, "combat", |_| {}).with_start(move || {
                events.emit("wave_start", &[json!({ "wave": 1 })]);
            });
            ctx.add_system(system);

            ctx.events().once(
                "wave_start",
                Listener::new(|args| tracing::info!(payload = ?args, "first wave started")),
            );
            Ok(())
        })
        .with_version("0.9.0"),
    )
}

fn loot() -> ExtensionRef {
    ExtensionRef::factory(|| {
        let drops = Rc::new(Cell::new(0u64));
        Ok(ExtensionDescriptor::new("core.loot", move |ctx| {
            ctx.register_content_type(
                ContentType::new("loot.gem", "item").with_schema(json!({ "value": "number" })),
            );

            let dropped = Rc::clone(&drops);
            ctx.events().on(
                "wave_start",
                Listener::new(move |_| dropped.set(dropped.get() + 3)),
            );

            let system = counted(ctx, "loot", |_| {});
            ctx.add_system(system);
            Ok(())
        })
        .with_version("0.3.0"))
    })
}

fn unstable() -> ExtensionRef {
    ExtensionRef::descriptor(ExtensionDescriptor::new("demo.unstable", |ctx| {
        ctx.register_ability(Ability::new("unstable.blink"));
        ctx.add_system(System::new("unstable", |_| {}));
        ctx.events().on("input", Listener::new(|_| {}));
        Err(PluginError::extension("asset pack 'blink.pak' is missing"))
    }))
}
