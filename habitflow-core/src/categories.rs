//! Static habit categories and suggested habit templates.

use serde::Serialize;

/// A habit category with suggested templates.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    /// Hex color used by dashboards
    pub color: &'static str,
    pub icon: &'static str,
    pub suggestions: &'static [&'static str],
}

const CATEGORIES: &[Category] = &[
    Category {
        id: "health",
        name: "Health",
        color: "#4caf50",
        icon: "heart",
        suggestions: &[
            "Drink 8 glasses of water",
            "Take vitamins",
            "Sleep 8 hours",
            "Eat a serving of vegetables",
        ],
    },
    Category {
        id: "fitness",
        name: "Fitness",
        color: "#f44336",
        icon: "dumbbell",
        suggestions: &[
            "Morning run",
            "10,000 steps",
            "Stretch for 10 minutes",
            "Strength training",
        ],
    },
    Category {
        id: "mindfulness",
        name: "Mindfulness",
        color: "#9c27b0",
        icon: "lotus",
        suggestions: &[
            "Meditate for 10 minutes",
            "Write in a gratitude journal",
            "Digital detox hour",
        ],
    },
    Category {
        id: "learning",
        name: "Learning",
        color: "#2196f3",
        icon: "book",
        suggestions: &[
            "Read 20 pages",
            "Practice a language",
            "Watch a lecture",
        ],
    },
    Category {
        id: "productivity",
        name: "Productivity",
        color: "#ff9800",
        icon: "check",
        suggestions: &[
            "Plan tomorrow",
            "Inbox zero",
            "Two hours of deep work",
        ],
    },
    Category {
        id: "social",
        name: "Social",
        color: "#00bcd4",
        icon: "people",
        suggestions: &["Call a friend", "Family dinner", "Send a thank-you note"],
    },
];

/// All categories, in display order.
pub fn categories() -> &'static [Category] {
    CATEGORIES
}

/// Look up a category by id.
pub fn category(id: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.id == id)
}

/// Suggested habit templates for a category; empty for unknown ids.
pub fn suggestions(id: &str) -> &'static [&'static str] {
    category(id).map(|c| c.suggestions).unwrap_or(&[])
}
