// Author: Dustin Pilgrim
// License: MIT

//! Fixed tables of selectable display and power methods.
//!
//! Row order is the numeric value stored in the `display_method` and
//! `power_method` settings. Never reorder or remove rows, only append.

use crate::core::action::Action;
use crate::core::error::Error;

/// Name shared by the no-op rows of both tables.
pub const DO_NOTHING: &str = "do-nothing";

#[derive(Debug, PartialEq, Eq)]
pub struct DisplayMethod {
    pub name: &'static str,
    pub title: &'static str,
    pub off: Action,
    pub on: Action,
}

#[derive(Debug, PartialEq, Eq)]
pub struct PowerMethod {
    pub name: &'static str,
    pub title: &'static str,
    /// There is no "on" counterpart: a powered-down system is not resumed by us.
    pub off: Action,
}

impl DisplayMethod {
    pub fn is_noop(&self) -> bool {
        !self.off.has_side_effect() && !self.on.has_side_effect()
    }
}

impl PowerMethod {
    pub fn is_noop(&self) -> bool {
        !self.off.has_side_effect()
    }
}

pub static DISPLAY_METHODS: [DisplayMethod; 10] = [
    DisplayMethod {
        name: DO_NOTHING,
        title: "Do nothing",
        off: Action::Log("Do nothing to power off display"),
        on: Action::Log("Do nothing to power back on display"),
    },
    DisplayMethod {
        name: "cec-builtin",
        title: "CEC (built-in)",
        off: Action::Builtin("CECStandby"),
        on: Action::Builtin("CECActivateSource"),
    },
    DisplayMethod {
        name: "no-signal-rpi",
        title: "No Signal on Raspberry Pi (using vcgencmd)",
        off: Action::Command(&["vcgencmd", "display_power", "0"]),
        on: Action::Command(&["vcgencmd", "display_power", "1"]),
    },
    DisplayMethod {
        name: "dpms-builtin",
        title: "DPMS (built-in)",
        off: Action::Builtin("ToggleDPMS"),
        on: Action::Builtin("ToggleDPMS"),
    },
    DisplayMethod {
        name: "dpms-xset",
        title: "DPMS (using xset)",
        off: Action::Command(&["xset", "dpms", "force", "off"]),
        on: Action::Command(&["xset", "dpms", "force", "on"]),
    },
    DisplayMethod {
        name: "dpms-vbetool",
        title: "DPMS (using vbetool)",
        off: Action::Command(&["vbetool", "dpms", "off"]),
        on: Action::Command(&["vbetool", "dpms", "on"]),
    },
    // TODO: verify on real hardware; "--output CRT-0" is passed as a single argument
    DisplayMethod {
        name: "dpms-xrandr",
        title: "DPMS (using xrandr)",
        off: Action::Command(&["xrandr", "--output CRT-0", "off"]),
        on: Action::Command(&["xrandr", "--output CRT-0", "on"]),
    },
    DisplayMethod {
        name: "cec-android",
        title: "CEC on Android (kernel)",
        off: Action::Command(&["su", "-c", "echo 0 >/sys/devices/virtual/graphics/fb0/cec"]),
        on: Action::Command(&["su", "-c", "echo 1 >/sys/devices/virtual/graphics/fb0/cec"]),
    },
    // bl_power: 1 means off, 0 means on
    DisplayMethod {
        name: "backlight-rpi",
        title: "Backlight on Raspberry Pi (kernel)",
        off: Action::Command(&["su", "-c", "echo 1 >/sys/class/backlight/rpi_backlight/bl_power"]),
        on: Action::Command(&["su", "-c", "echo 0 >/sys/class/backlight/rpi_backlight/bl_power"]),
    },
    // Known to not come back on with a Raspberry Pi 3.
    DisplayMethod {
        name: "tvservice-rpi",
        title: "HDMI on Raspberry Pi (tvservice)",
        off: Action::Command(&["tvservice", "-o"]),
        on: Action::Command(&["tvservice", "-p"]),
    },
];

pub static POWER_METHODS: [PowerMethod; 7] = [
    PowerMethod {
        name: DO_NOTHING,
        title: "Do nothing",
        off: Action::Log("Do nothing to power off system"),
    },
    PowerMethod {
        name: "suspend-builtin",
        title: "Suspend (built-in)",
        off: Action::Rpc("System.Suspend"),
    },
    PowerMethod {
        name: "hibernate-builtin",
        title: "Hibernate (built-in)",
        off: Action::Rpc("System.Hibernate"),
    },
    PowerMethod {
        name: "quit-builtin",
        title: "Quit (built-in)",
        off: Action::Rpc("Application.Quit"),
    },
    PowerMethod {
        name: "shutdown-builtin",
        title: "ShutDown action (built-in)",
        off: Action::Rpc("System.Shutdown"),
    },
    PowerMethod {
        name: "reboot-builtin",
        title: "Reboot (built-in)",
        off: Action::Rpc("System.Reboot"),
    },
    PowerMethod {
        name: "powerdown-builtin",
        title: "Powerdown (built-in)",
        off: Action::Rpc("System.Powerdown"),
    },
];

pub fn display_method(index: usize) -> Result<&'static DisplayMethod, Error> {
    DISPLAY_METHODS
        .get(index)
        .ok_or(Error::UnknownDisplayMethod(index))
}

pub fn power_method(index: usize) -> Result<&'static PowerMethod, Error> {
    POWER_METHODS
        .get(index)
        .ok_or(Error::UnknownPowerMethod(index))
}

/// Human readable listing of both tables, as shown by `turnoff list`.
pub fn format_tables() -> String {
    let mut out = String::from("Display methods:\n");
    for (i, m) in DISPLAY_METHODS.iter().enumerate() {
        out.push_str(&format!("  {i:>2}  {:<16} {}\n", m.name, m.title));
    }

    out.push_str("\nPower methods:\n");
    for (i, m) in POWER_METHODS.iter().enumerate() {
        out.push_str(&format!("  {i:>2}  {:<16} {}\n", m.name, m.title));
    }
    out
}

pub fn tables_json() -> serde_json::Value {
    let display: Vec<_> = DISPLAY_METHODS
        .iter()
        .enumerate()
        .map(|(i, m)| {
            serde_json::json!({
                "index": i,
                "name": m.name,
                "title": m.title,
                "off": m.off.to_string(),
                "on": m.on.to_string(),
            })
        })
        .collect();

    let power: Vec<_> = POWER_METHODS
        .iter()
        .enumerate()
        .map(|(i, m)| {
            serde_json::json!({
                "index": i,
                "name": m.name,
                "title": m.title,
                "off": m.off.to_string(),
            })
        })
        .collect();

    serde_json::json!({ "display_methods": display, "power_methods": power })
}
