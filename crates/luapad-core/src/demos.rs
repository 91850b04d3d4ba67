//! Demo scripts bundled into the binary

/// A bundled script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Demo {
    pub name: &'static str,
    pub source: &'static str,
}

const DEMOS: &[Demo] = &[
    Demo {
        name: "particles",
        source: include_str!("../demos/particles.lua"),
    },
    Demo {
        name: "bounce",
        source: include_str!("../demos/bounce.lua"),
    },
    Demo {
        name: "clock",
        source: include_str!("../demos/clock.lua"),
    },
    Demo {
        name: "sprites",
        source: include_str!("../demos/sprites.lua"),
    },
];

pub fn all() -> &'static [Demo] {
    DEMOS
}

pub fn names() -> impl Iterator<Item = &'static str> {
    DEMOS.iter().map(|demo| demo.name)
}

pub fn get(name: &str) -> Option<&'static Demo> {
    DEMOS.iter().find(|demo| demo.name.eq_ignore_ascii_case(name))
}

/// The demo after `name`, wrapping around; the first demo for unknown names
pub fn next_after(name: &str) -> &'static Demo {
    let index = DEMOS
        .iter()
        .position(|demo| demo.name == name)
        .map_or(0, |i| (i + 1) % DEMOS.len());
    &DEMOS[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(get("Particles").map(|d| d.name), Some("particles"));
        assert!(get("nope").is_none());
    }

    #[test]
    fn test_next_wraps() {
        assert_eq!(next_after("particles").name, "bounce");
        assert_eq!(next_after("sprites").name, "particles");
        assert_eq!(next_after("unknown").name, "particles");
    }

    #[test]
    fn test_every_demo_compiles() {
        let lua = mlua::Lua::new();
        for demo in all() {
            lua.load(demo.source)
                .set_name(demo.name)
                .into_function()
                .unwrap_or_else(|err| panic!("{} failed to compile: {err}", demo.name));
        }
    }
}
