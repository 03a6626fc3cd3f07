//! Built-in demo vault so the binary is usable without an external backend.
//!
//! A handful of in-memory records back both collaborator seams: suggestions
//! are prefix matches over command templates and concrete lookups, and
//! lookups render record cards. Each repeat lookup bumps the record's rumor
//! counter so the in-place update (and its changed-field highlight) is easy
//! to see.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use lorebook_core::BackendError;
use lorebook_core::CommandExecutor;
use lorebook_core::Suggestion;
use lorebook_core::SuggestionSource;

struct Person {
    id: &'static str,
    name: &'static str,
    summary: &'static str,
    species: &'static str,
    age: u32,
    home: &'static str,
}

struct Place {
    id: &'static str,
    name: &'static str,
    summary: &'static str,
    kind: &'static str,
    region: &'static str,
}

const PEOPLE: &[Person] = &[
    Person {
        id: "npc-7f3d",
        name: "Alice Thorn",
        summary: "baker of Copperhill",
        species: "human",
        age: 31,
        home: "Copperhill",
    },
    Person {
        id: "npc-22ab",
        name: "Brother Caliban",
        summary: "wandering monk",
        species: "half-orc",
        age: 47,
        home: "the road",
    },
    Person {
        id: "npc-91c0",
        name: "Mirela Voss",
        summary: "smuggler turned cartographer",
        species: "elf",
        age: 112,
        home: "Saltmarsh",
    },
];

const PLACES: &[Place] = &[
    Place {
        id: "place-03aa",
        name: "The Wyrm's Rest",
        summary: "roadside inn",
        kind: "inn",
        region: "Copperhill Vale",
    },
    Place {
        id: "place-5e11",
        name: "Copperhill",
        summary: "mining town",
        kind: "town",
        region: "Copperhill Vale",
    },
    Place {
        id: "place-77b2",
        name: "Saltmarsh",
        summary: "fishing port",
        kind: "port",
        region: "the Brine Coast",
    },
];

const TEMPLATES: &[(&str, &str)] = &[
    ("person [name]", "look up a person by name"),
    ("place [name]", "look up a place by name"),
    ("journal", "list everything recorded so far"),
    ("help", "how to use the terminal"),
    ("about", "what this is"),
];

#[derive(Default)]
pub struct DemoVault {
    /// Lookup counter per record id; bumps a visible field on every repeat.
    visits: Mutex<HashMap<String, u32>>,
}

impl DemoVault {
    pub fn new() -> Self {
        Self::default()
    }

    fn visit(&self, id: &str) -> u32 {
        let mut visits = match self.visits.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let count = visits.entry(id.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    fn person_card(&self, person: &Person) -> String {
        let rumors = self.visit(person.id);
        format!(
            "<div class=\"record npc\" data-id=\"{id}\">\n\n\
             # {name}\n\n\
             *{summary}*\n\n\
             Species: {species}\n\
             Age: {age}\n\
             Home: {home}\n\
             Rumors heard: {rumors}\n\n\
             </div>",
            id = person.id,
            name = person.name,
            summary = person.summary,
            species = person.species,
            age = person.age,
            home = person.home,
        )
    }

    fn place_card(&self, place: &Place) -> String {
        let rumors = self.visit(place.id);
        format!(
            "<div class=\"record place\" data-id=\"{id}\">\n\n\
             # {name}\n\n\
             *{summary}*\n\n\
             Kind: {kind}\n\
             Region: {region}\n\
             Rumors heard: {rumors}\n\n\
             </div>",
            id = place.id,
            name = place.name,
            summary = place.summary,
            kind = place.kind,
            region = place.region,
        )
    }

    fn journal(&self) -> String {
        let mut lines = vec!["# Journal".to_string(), String::new()];
        for person in PEOPLE {
            lines.push(format!("- ~~person {}~~: {}", person.name, person.summary));
        }
        for place in PLACES {
            lines.push(format!("- ~~place {}~~: {}", place.name, place.summary));
        }
        lines.join("\n")
    }
}

fn help_text() -> String {
    "# Help\n\n\
     Type a command and press Enter. Suggestions appear as you type; Tab \
     completes, Up and Down recall earlier commands.\n\n\
     - ~~person [name]~~ shows a person's record\n\
     - ~~place [name]~~ shows a place's record\n\
     - ~~journal~~ lists everything recorded so far\n\n\
     Bracketed parts are placeholders: submitting a command that still has \
     one selects it for editing instead of running."
        .to_string()
}

fn about_text() -> String {
    "The lorebook keeps track of the people and places in your world. \
     Records update in place as you learn more; see the \
     [field guide](https://example.com/lorebook/guide) for the long version."
        .to_string()
}

fn matches_query(candidate: &str, query: &str) -> bool {
    candidate.to_lowercase().starts_with(&query.to_lowercase())
}

#[async_trait]
impl SuggestionSource for DemoVault {
    async fn suggest(&self, query: &str) -> Result<Vec<Suggestion>, BackendError> {
        if query.is_empty() {
            return Ok(TEMPLATES
                .iter()
                .map(|(suggestion, description)| Suggestion::new(*suggestion, *description))
                .collect());
        }
        let mut items: Vec<Suggestion> = TEMPLATES
            .iter()
            .filter(|(suggestion, _)| matches_query(suggestion, query))
            .map(|(suggestion, description)| Suggestion::new(*suggestion, *description))
            .collect();
        items.extend(
            PEOPLE
                .iter()
                .map(|person| {
                    Suggestion::new(format!("person {}", person.name), person.summary)
                })
                .filter(|item| matches_query(&item.suggestion, query)),
        );
        items.extend(
            PLACES
                .iter()
                .map(|place| Suggestion::new(format!("place {}", place.name), place.summary))
                .filter(|item| matches_query(&item.suggestion, query)),
        );
        Ok(items)
    }
}

#[async_trait]
impl CommandExecutor for DemoVault {
    async fn execute(&self, command: &str) -> Result<String, BackendError> {
        let command = command.trim();
        if let Some(name) = command.strip_prefix("person ") {
            let person = PEOPLE
                .iter()
                .find(|person| person.name.eq_ignore_ascii_case(name.trim()));
            return match person {
                Some(person) => Ok(self.person_card(person)),
                None => Err(BackendError::Failed(format!(
                    "No one named {} appears in the lorebook.",
                    name.trim()
                ))),
            };
        }
        if let Some(name) = command.strip_prefix("place ") {
            let place = PLACES
                .iter()
                .find(|place| place.name.eq_ignore_ascii_case(name.trim()));
            return match place {
                Some(place) => Ok(self.place_card(place)),
                None => Err(BackendError::Failed(format!(
                    "No place named {} appears in the lorebook.",
                    name.trim()
                ))),
            };
        }
        match command {
            "journal" => Ok(self.journal()),
            "help" => Ok(help_text()),
            "about" => Ok(about_text()),
            other => Err(BackendError::UnknownCommand(other.to_string())),
        }
    }

    async fn greeting(&self) -> Option<String> {
        Some(
            "# The Lorebook\n\n\
             Well met, keeper. Ask after ~~person [name]~~ or ~~place [name]~~, \
             or start with ~~help~~."
                .to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used)]
    use super::*;
    use lorebook_core::OutputBlock;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn empty_query_offers_the_templates() {
        let vault = DemoVault::new();
        let items = vault.suggest("").await.unwrap_or_default();
        assert_eq!(items.len(), TEMPLATES.len());
        assert_eq!(items[0].suggestion, "person [name]");
    }

    #[tokio::test]
    async fn queries_filter_by_case_insensitive_prefix() {
        let vault = DemoVault::new();
        let items = vault.suggest("person a").await.unwrap_or_default();
        let names: Vec<&str> = items.iter().map(|i| i.suggestion.as_str()).collect();
        assert_eq!(names, ["person Alice Thorn"]);
    }

    #[tokio::test]
    async fn template_queries_keep_matching_through_the_bracket() {
        let vault = DemoVault::new();
        let items = vault.suggest("person [").await.unwrap_or_default();
        assert!(items.iter().any(|i| i.suggestion == "person [name]"));
    }

    #[tokio::test]
    async fn lookups_render_cards_whose_rumor_counter_advances() {
        let vault = DemoVault::new();
        let first = vault.execute("person Alice Thorn").await.unwrap_or_default();
        assert!(first.contains("data-id=\"npc-7f3d\""));
        assert!(first.contains("Rumors heard: 1"));

        let second = vault.execute("person alice thorn").await.unwrap_or_default();
        assert!(second.contains("Rumors heard: 2"));

        let block = OutputBlock::response(&second);
        let entity = block.entity().expect("card should carry an entity key");
        assert_eq!(entity.kind, "npc");
        assert_eq!(entity.id, "npc-7f3d");
    }

    #[tokio::test]
    async fn unknown_commands_fail_loudly() {
        let vault = DemoVault::new();
        let result = vault.execute("frobnicate").await;
        assert!(result.is_err());
    }
}
