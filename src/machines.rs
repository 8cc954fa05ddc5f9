//! Built-in machines.
//!
//! Both assume the agent starts standing on flat, diggable ground (dirt or grass) with the
//! build area ahead of it.

use crate::blueprint::{Blueprint, Directive, PlacementDirective};
use crate::geometry::{Facing, Offset};

/// Four-long water trench with sugar cane planted along both banks.
pub fn sugar_cane_farm() -> Blueprint {
    let trench: Vec<Offset> = (1..=4).map(|f| Offset::from((0, -1, f))).collect();

    let mut blueprint = Blueprint::new("sugar_cane_farm")
        .requires("water_bucket", 2)
        .requires("sugar_cane", 8)
        .step(Directive::SetOrigin)
        .step(Directive::dig(trench))
        .step(Directive::Pour {
            offset: Offset::from((0, -1, 1)),
        })
        .step(Directive::Pour {
            offset: Offset::from((0, -1, 4)),
        })
        .step(Directive::Wait { millis: 1000 });

    for side in [1, -1] {
        for f in 1..=4 {
            blueprint = blueprint.step(Directive::Place(PlacementDirective::on_top(
                "sugar_cane",
                (side, -1, f),
            )));
        }
    }

    blueprint.step(Directive::Walk {
        offset: Offset::from((2, 0, 0)),
    })
}

/// Short rail line with a lever-powered booster, ridden by hopping along it.
pub fn minecart_lever_line() -> Blueprint {
    let mut blueprint = Blueprint::new("minecart_lever_line")
        .requires("rail", 3)
        .requires("powered_rail", 1)
        .requires("lever", 1)
        .step(Directive::SetOrigin);

    for f in 1..=4 {
        let item = if f == 2 { "powered_rail" } else { "rail" };
        blueprint = blueprint.step(Directive::Place(PlacementDirective::on_top(
            item,
            (0, -1, f),
        )));
    }

    blueprint
        .step(Directive::Place(
            PlacementDirective::on_top("lever", (1, -1, 2)).facing(Facing::North),
        ))
        .step(Directive::Toggle {
            block: "lever".to_string(),
            offset: Offset::from((1, 0, 2)),
        })
        .step(Directive::Walk {
            offset: Offset::from((0, 0, 1)),
        })
        .step(Directive::Jump { millis: 500 })
}

/// Looks up a built-in machine by name.
pub fn by_name(name: &str) -> Option<Blueprint> {
    match name {
        "sugar_cane_farm" => Some(sugar_cane_farm()),
        "minecart_lever_line" => Some(minecart_lever_line()),
        _ => None,
    }
}
