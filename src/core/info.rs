// Author: Dustin Pilgrim
// License: MIT

use serde_json::json;

use crate::core::session::{Controller, Phase};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoSnapshot {
    pub phase: Phase,
    pub display_method: Option<&'static str>,
    pub power_method: Option<&'static str>,
    pub mute: bool,
    pub host_connected: bool,
    pub config_path: Option<String>,
}

impl InfoSnapshot {
    pub fn capture(controller: &Controller, host_connected: bool, config_path: Option<String>) -> Self {
        let session = controller.session();
        Self {
            phase: controller.phase(),
            display_method: session.map(|s| s.display.name),
            power_method: session.map(|s| s.power.name),
            mute: session.is_some_and(|s| s.mute),
            host_connected,
            config_path,
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = format!("Session: {:?}\n", self.phase);
        if let (Some(display), Some(power)) = (self.display_method, self.power_method) {
            out.push_str(&format!("Display method: {display}\n"));
            out.push_str(&format!("Power method: {power}\n"));
            out.push_str(&format!("Muted: {}\n", self.mute));
        }
        out.push_str(&format!(
            "Host: {}\n",
            if self.host_connected { "connected" } else { "disconnected" }
        ));
        out.push_str(&format!(
            "Config: {}",
            self.config_path.as_deref().unwrap_or("<built-in defaults>")
        ));
        out
    }

    pub fn to_json(&self) -> String {
        json!({
            "phase": format!("{:?}", self.phase).to_lowercase(),
            "display_method": self.display_method,
            "power_method": self.power_method,
            "mute": self.mute,
            "host_connected": self.host_connected,
            "config_path": self.config_path,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_snapshot() {
        let snap = InfoSnapshot::capture(&Controller::new(), false, None);
        assert_eq!(snap.phase, Phase::Idle);
        assert_eq!(snap.display_method, None);

        let text = snap.to_text();
        assert!(text.contains("Idle"));
        assert!(text.contains("disconnected"));
        assert!(!text.contains("Display method"));

        let v: serde_json::Value = serde_json::from_str(&snap.to_json()).unwrap();
        assert_eq!(v["phase"], "idle");
        assert_eq!(v["display_method"], serde_json::Value::Null);
    }
}
