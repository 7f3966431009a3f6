use std::sync::OnceLock;

use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use serde_json::from_str;

use crate::error::BankError;

static BANK_DIR: Dir = include_dir!("src/bank");

/// Built-in categories in the order a picker should list them.
pub const BUILTIN_CATEGORIES: [&str; 3] = ["html", "css", "js"];

/// Category served when a lookup misses.
pub const DEFAULT_CATEGORY: &str = "html";

pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub text: String,
    pub options: [String; OPTIONS_PER_QUESTION],
    pub correct_index: usize,
}

impl Question {
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_index
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<Question>,
}

impl Category {
    /// Parse a category document, rejecting answers that point past the options.
    pub fn from_json(file: &str, json: &str) -> Result<Self, BankError> {
        let category: Category = from_str(json).map_err(|source| BankError::Parse {
            file: file.to_string(),
            source,
        })?;
        category.validate()?;
        Ok(category)
    }

    fn validate(&self) -> Result<(), BankError> {
        for (i, q) in self.questions.iter().enumerate() {
            if q.correct_index >= OPTIONS_PER_QUESTION {
                return Err(BankError::AnswerOutOfRange {
                    category: self.id.clone(),
                    question: i,
                    index: q.correct_index,
                });
            }
        }
        Ok(())
    }
}

/// Read-only catalog of questions grouped by category.
#[derive(Clone, Debug)]
pub struct QuestionBank {
    categories: Vec<Category>,
    default_index: usize,
}

impl QuestionBank {
    pub fn new(categories: Vec<Category>, default_id: &str) -> Result<Self, BankError> {
        for (i, c) in categories.iter().enumerate() {
            c.validate()?;
            if categories[..i].iter().any(|other| other.id == c.id) {
                return Err(BankError::DuplicateCategory(c.id.clone()));
            }
        }

        let default_index = categories
            .iter()
            .position(|c| c.id == default_id)
            .ok_or_else(|| BankError::MissingDefault(default_id.to_string()))?;

        Ok(Self {
            categories,
            default_index,
        })
    }

    /// The bank compiled into the crate, initialized once per process.
    pub fn builtin() -> &'static QuestionBank {
        static BUILTIN: OnceLock<QuestionBank> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            load_builtin().expect("embedded question bank should be valid")
        })
    }

    /// Questions for `id`, or the default category's when `id` is unknown.
    pub fn questions_for(&self, id: &str) -> &[Question] {
        &self.resolve(id).questions
    }

    /// The category actually served for `id` after the default fallback.
    pub fn resolve(&self, id: &str) -> &Category {
        self.get(id).unwrap_or_else(|| self.default_category())
    }

    pub fn get(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn default_category(&self) -> &Category {
        &self.categories[self.default_index]
    }
}

fn load_builtin() -> Result<QuestionBank, BankError> {
    let categories = BUILTIN_CATEGORIES
        .iter()
        .map(|id| read_category_from_file(&format!("{id}.json")))
        .collect::<Result<Vec<_>, _>>()?;

    QuestionBank::new(categories, DEFAULT_CATEGORY)
}

fn read_category_from_file(file_name: &str) -> Result<Category, BankError> {
    let file = BANK_DIR
        .get_file(file_name)
        .ok_or_else(|| BankError::MissingFile(file_name.to_string()))?;

    let contents = file.contents_utf8().ok_or_else(|| BankError::NotUtf8 {
        file: file_name.to_string(),
    })?;

    Category::from_json(file_name, contents)
}
