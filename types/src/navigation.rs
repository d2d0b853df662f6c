use serde::Serialize;

/// Where a navigation entry is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NavPriority {
    /// Sidebar and mobile tab bar.
    P0,
    /// Sidebar only.
    P1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub icon: &'static str,
    pub label: &'static str,
    pub href: &'static str,
    pub priority: NavPriority,
}

pub static NAV_ITEMS: [NavItem; 4] = [
    NavItem {
        icon: "📋",
        label: "Backlog",
        href: "/backlog",
        priority: NavPriority::P0,
    },
    NavItem {
        icon: "🎯",
        label: "This Week's Sprint",
        href: "/sprint",
        priority: NavPriority::P0,
    },
    NavItem {
        icon: "📊",
        label: "History",
        href: "/history",
        priority: NavPriority::P0,
    },
    NavItem {
        icon: "⚙️",
        label: "Settings",
        href: "/settings",
        priority: NavPriority::P1,
    },
];

/// Entries for the mobile tab bar (everything except sidebar-only items).
pub fn mobile_nav_items() -> impl Iterator<Item = &'static NavItem> {
    NAV_ITEMS
        .iter()
        .filter(|item| item.priority == NavPriority::P0)
}
