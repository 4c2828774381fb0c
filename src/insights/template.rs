//! Template-backed persona generation.

use async_trait::async_trait;

use super::{InsightError, InsightGenerator, Persona};
use crate::connectors::SiteProfile;

struct PersonaTemplate {
    name: &'static str,
    job_title: &'static str,
    company_size: &'static str,
    pain_points: &'static [&'static str],
    goals: &'static [&'static str],
    channels: &'static [&'static str],
}

const TECHNOLOGY_PERSONAS: &[PersonaTemplate] = &[
    PersonaTemplate {
        name: "Technical Decision Maker",
        job_title: "VP of Engineering",
        company_size: "Mid-market (100-1000 employees)",
        pain_points: &[
            "Tool sprawl across engineering teams",
            "Difficulty proving ROI of platform investments",
        ],
        goals: &[
            "Consolidate the stack without slowing delivery",
            "Reduce operational overhead",
        ],
        channels: &["Search", "LinkedIn", "Developer communities"],
    },
    PersonaTemplate {
        name: "Growth Operator",
        job_title: "Head of Growth",
        company_size: "Startup (10-100 employees)",
        pain_points: &[
            "Limited budget with aggressive targets",
            "Fragmented analytics across channels",
        ],
        goals: &[
            "Find scalable acquisition channels",
            "Automate repetitive campaign work",
        ],
        channels: &["Search", "Paid social", "Newsletters"],
    },
    PersonaTemplate {
        name: "IT Buyer",
        job_title: "Director of IT",
        company_size: "Enterprise (1000+ employees)",
        pain_points: &[
            "Security and compliance review bottlenecks",
            "Integrating new tools with legacy systems",
        ],
        goals: &[
            "Standardize vendor footprint",
            "Minimize rollout risk",
        ],
        channels: &["Analyst reports", "Vendor briefings", "Search"],
    },
];

const MARKETING_PERSONAS: &[PersonaTemplate] = &[
    PersonaTemplate {
        name: "Performance Marketer",
        job_title: "Performance Marketing Manager",
        company_size: "Mid-market (100-1000 employees)",
        pain_points: &[
            "Rising acquisition costs",
            "Attribution gaps between platforms",
        ],
        goals: &[
            "Lower CPA while scaling spend",
            "Consolidate reporting in one place",
        ],
        channels: &["Paid search", "Paid social", "Industry newsletters"],
    },
    PersonaTemplate {
        name: "Agency Lead",
        job_title: "Digital Agency Owner",
        company_size: "Small (1-50 employees)",
        pain_points: &[
            "Manual reporting eats billable hours",
            "Clients demand faster insights",
        ],
        goals: &[
            "Automate client reporting",
            "Win larger retainers",
        ],
        channels: &["Search", "Referrals", "LinkedIn"],
    },
];

const ECOMMERCE_PERSONAS: &[PersonaTemplate] = &[
    PersonaTemplate {
        name: "Store Owner",
        job_title: "E-commerce Founder",
        company_size: "Small (1-50 employees)",
        pain_points: &[
            "Thin margins squeezed by ad costs",
            "Hard to tell which campaigns actually convert",
        ],
        goals: &[
            "Grow repeat purchase rate",
            "Spend ad budget where it converts",
        ],
        channels: &["Paid social", "Search", "Email"],
    },
    PersonaTemplate {
        name: "Marketplace Manager",
        job_title: "Head of Digital",
        company_size: "Mid-market (100-1000 employees)",
        pain_points: &[
            "Inventory and promotion timing mismatch",
            "Competitors undercutting on branded terms",
        ],
        goals: &[
            "Defend branded search traffic",
            "Coordinate promotions across channels",
        ],
        channels: &["Search", "Shopping ads", "Affiliates"],
    },
];

/// Industry-keyed template generator. Always succeeds; confidence is
/// deliberately modest since nothing here saw the actual audience.
pub struct TemplateInsightGenerator;

impl TemplateInsightGenerator {
    pub fn new() -> Self {
        Self
    }

    fn templates_for(industry: &str) -> &'static [PersonaTemplate] {
        match industry {
            "marketing" => MARKETING_PERSONAS,
            "ecommerce" => ECOMMERCE_PERSONAS,
            _ => TECHNOLOGY_PERSONAS,
        }
    }
}

impl Default for TemplateInsightGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InsightGenerator for TemplateInsightGenerator {
    fn name(&self) -> &'static str {
        "template"
    }

    async fn personas(&self, profile: &SiteProfile) -> Result<Vec<Persona>, InsightError> {
        let industry = profile.industry.as_deref().unwrap_or("technology");
        let templates = Self::templates_for(industry);

        let keywords: Vec<String> = profile.key_topics.iter().take(5).cloned().collect();

        Ok(templates
            .iter()
            .take(3)
            .map(|template| Persona {
                name: template.name.to_string(),
                job_title: template.job_title.to_string(),
                industry: industry.to_string(),
                company_size: template.company_size.to_string(),
                pain_points: template.pain_points.iter().map(|s| s.to_string()).collect(),
                goals: template.goals.iter().map(|s| s.to_string()).collect(),
                keywords: keywords.clone(),
                preferred_channels: template.channels.iter().map(|s| s.to_string()).collect(),
                confidence_score: 0.5,
            })
            .collect())
    }
}
