/// A preset persona the user can talk to.
#[derive(Debug, Clone, PartialEq)]
pub struct Specialist {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub description: String,
    pub system_instruction: String,
    /// Greeting template; `{name}` is replaced with the user's first name.
    pub welcome_template: String,
}

impl Specialist {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        system_instruction: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            welcome_template: format!("Hello {{name}}! I'm your {}. How can I help you today?", name),
            name,
            avatar: String::new(),
            description: String::new(),
            system_instruction: system_instruction.into(),
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = avatar.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_welcome(mut self, template: impl Into<String>) -> Self {
        self.welcome_template = template.into();
        self
    }

    pub fn welcome_message(&self, user_first_name: &str) -> String {
        self.welcome_template.replace("{name}", user_first_name)
    }
}

/// Ordered set of specialists. The first entry is the default selection.
#[derive(Debug, Clone)]
pub struct SpecialistRegistry {
    specialists: Vec<Specialist>,
}

impl SpecialistRegistry {
    /// Build a registry. Later duplicates of an id are dropped.
    pub fn new(specialists: Vec<Specialist>) -> Self {
        let mut unique: Vec<Specialist> = Vec::with_capacity(specialists.len());
        for specialist in specialists {
            if !unique.iter().any(|s| s.id == specialist.id) {
                unique.push(specialist);
            }
        }
        Self { specialists: unique }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            Specialist::new(
                "business-analyst",
                "Business Analyst",
                "You are an experienced business analyst. Break problems into \
                 measurable goals, identify stakeholders and risks, and back every \
                 recommendation with the data the user provides. Answer in clear \
                 sections with concrete next steps.",
            )
            .with_avatar("📊")
            .with_description("Market sizing, KPIs, process improvement"),
            Specialist::new(
                "financial-advisor",
                "Financial Advisor",
                "You are a careful financial advisor. Explain trade-offs in plain \
                 language, show the arithmetic behind any figure, and state your \
                 assumptions. Never present estimates as guarantees.",
            )
            .with_avatar("💰")
            .with_description("Budgets, forecasts, investment trade-offs"),
            Specialist::new(
                "marketing-strategist",
                "Marketing Strategist",
                "You are a pragmatic marketing strategist. Tailor advice to the \
                 user's audience and budget, propose channels with expected \
                 outcomes, and suggest how to measure success.",
            )
            .with_avatar("📣")
            .with_description("Positioning, campaigns, growth channels"),
            Specialist::new(
                "legal-consultant",
                "Legal Consultant",
                "You are a legal consultant providing general information only. \
                 Highlight relevant regulations and risks, flag where jurisdiction \
                 matters, and recommend consulting a licensed attorney for \
                 decisions.",
            )
            .with_avatar("⚖️")
            .with_description("Contracts, compliance, regulatory risk")
            .with_welcome(
                "Hello {name}! I'm your Legal Consultant. I can outline legal \
                 considerations, but this is not legal advice. What would you like to review?",
            ),
            Specialist::new(
                "operations-expert",
                "Operations Expert",
                "You are an operations expert. Focus on throughput, cost, and \
                 reliability; propose step-by-step process changes and the metrics \
                 that would confirm they work.",
            )
            .with_avatar("⚙️")
            .with_description("Supply chain, logistics, workflow design"),
        ])
    }

    pub fn get(&self, id: &str) -> Option<&Specialist> {
        self.specialists.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn default_id(&self) -> &str {
        self.specialists
            .first()
            .map(|s| s.id.as_str())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Specialist> {
        self.specialists.iter()
    }

    pub fn len(&self) -> usize {
        self.specialists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specialists.is_empty()
    }
}

impl Default for SpecialistRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = SpecialistRegistry::builtin();
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.default_id(), "business-analyst");
        assert!(registry.contains("legal-consultant"));
        assert!(registry.get("astrologer").is_none());
    }

    #[test]
    fn test_welcome_message_personalised() {
        let specialist = Specialist::new("a", "Analyst", "x");
        assert_eq!(
            specialist.welcome_message("Ada"),
            "Hello Ada! I'm your Analyst. How can I help you today?"
        );
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let registry = SpecialistRegistry::new(vec![
            Specialist::new("a", "First", "x"),
            Specialist::new("a", "Second", "y"),
        ]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").unwrap().name, "First");
    }
}
