//! Skill candidate generation: the lexical pass that runs before any embedding.
//!
//! Three passes, merged in first-seen order and de-duplicated case-insensitively:
//! 1. a technology lexicon (word-bounded, case-insensitive except for "R");
//! 2. cue phrases such as "5 anos de experiência com X" or "proficient in X";
//! 3. delimited lists after a skills header ("Habilidades: ...").
//!
//! This stage over-generates on purpose. Precision comes from the semantic filter.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::encoder::normalize_text;

const TECH_LEXICON: &[&str] = &[
    // languages
    "Python", "Java", "C++", "JavaScript", "TypeScript", "C#", "PHP", "Ruby", "Go", "Rust",
    "Kotlin", "Swift", "Objective-C", "MATLAB", "Scala", "Groovy", "Clojure", "Elixir",
    "Haskell", "Lisp", "Lua", "Perl", "Shell", "Bash", "PowerShell", "VB.NET", "F#",
    // frameworks and test tooling
    "Django", "Flask", "FastAPI", "Spring", "Spring Boot", "React", "Vue", "Angular",
    "Svelte", "Next.js", "Nuxt", "Node.js", "Express", "Fastify", "Laravel", "Symfony",
    "ASP.NET", "Struts", "Hibernate", "SQLAlchemy", "Sequelize", "Knex", "Jest", "Pytest",
    "JUnit", "RSpec", "Mocha", "Jasmine",
    // databases
    "MySQL", "PostgreSQL", "Oracle", "SQL Server", "MongoDB", "Redis", "Elasticsearch",
    "Cassandra", "DynamoDB", "Firebase", "SQLite", "MariaDB", "CouchDB", "Neo4j",
    "Memcached", "Hive", "Spark SQL", "BigQuery", "Snowflake", "SQL",
    // cloud
    "AWS", "Azure", "Google Cloud", "GCP", "Heroku", "DigitalOcean", "Linode", "IBM Cloud",
    "Oracle Cloud", "Alibaba Cloud", "AWS Lambda", "Azure Functions", "Google Functions",
    "EC2", "S3", "RDS", "CloudFront", "Route 53",
    // devops
    "Docker", "Kubernetes", "Jenkins", "GitLab CI", "GitHub Actions", "CircleCI",
    "Travis CI", "Terraform", "Ansible", "Puppet", "Chef", "Vagrant", "CloudFormation",
    "Helm", "ArgoCD", "ECS", "EKS", "AKS", "Linux",
    // version control
    "Git", "GitHub", "GitLab", "Bitbucket", "SVN", "Mercurial", "Perforce",
    // methodologies and architecture
    "Agile", "Scrum", "Kanban", "XP", "Waterfall", "CI/CD", "TDD", "BDD", "DDD",
    "Clean Code", "Design Patterns", "SOLID", "REST", "GraphQL", "Microservices",
    // microsoft stack
    ".NET", "LINQ", "Entity Framework", "MS SQL", "Azure DevOps", "Visual Studio",
    "Windows Server", "Active Directory", "SharePoint", "Office 365", "Exchange", "Teams",
    // jvm and mobile
    "JVM", "Android", "iOS", "React Native", "Flutter", "Xamarin", "Ionic",
    // data
    "Pandas", "NumPy", "SciPy", "Scikit-learn", "TensorFlow", "PyTorch", "Keras",
    "Apache Spark", "Hadoop", "Pig", "Tableau", "Power BI", "Looker", "Alteryx",
    "Data Science", "Machine Learning", "Deep Learning", "NLP", "Computer Vision",
    // quality
    "Selenium", "Cypress", "Postman", "JMeter", "LoadRunner", "SoapUI", "TestNG",
    "Cucumber", "Robot Framework", "Gherkin",
];

/// Terms that collide with ordinary words when matched case-insensitively.
const CASE_SENSITIVE_LEXICON: &[&str] = &["R"];

static LEXICON_RE: Lazy<Regex> = Lazy::new(|| {
    let mut terms: Vec<&str> = TECH_LEXICON.to_vec();
    // Longest first so "Spring Boot" wins over "Spring" at the same position.
    terms.sort_by_key(|t| std::cmp::Reverse(t.len()));
    let alternation = terms
        .iter()
        .map(|t| word_bounded(t))
        .collect::<Vec<_>>()
        .join("|");
    let exact = CASE_SENSITIVE_LEXICON
        .iter()
        .map(|t| word_bounded(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i:{alternation})|(?:{exact})")).expect("technology lexicon compiles")
});

const PHRASE: &str = r"([\p{L}\p{N}\s\-\+#]+?)";

static CUE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(
            r"(?i)\d+\s*(?:anos?|meses|years?|months?)\s+(?:de\s+|of\s+)?(?:experiência|experiencia|atuação|atuacao|trabalho|experience|work)\s+(?:com|em|como|with|in|as)\s+{PHRASE}(?:[.,;\n]|$)"
        ),
        format!(
            r"(?i)(?:proficiente|proficient|proficiency|expertise|conhecimento profundo|domínio|dominio)\s+(?:em|de|com|in|with)\s+{PHRASE}(?:[.,;\n]|\s+e\s+|\s+and\s+|$)"
        ),
        format!(
            r"(?i)(?:especialista|especialização|especializacao|especializado|specialist|specialized|expert)\s+(?:em|de|in)\s+{PHRASE}(?:[.,;\n]|$)"
        ),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("cue pattern compiles"))
    .collect()
});

static SECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^\s*(?:skills|habilidades|competências|competencias|tecnologias|technologies|ferramentas|tools|stack|conhecimentos)\s*[:\-]\s*(.+)$",
    )
    .expect("section pattern compiles")
});

static LIST_SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*[,;|/•]\s*|\s+e\s+|\s+and\s+").expect("separator pattern compiles")
});

fn word_bounded(term: &str) -> String {
    let starts_word = term.chars().next().is_some_and(char::is_alphanumeric);
    let ends_word = term.chars().last().is_some_and(char::is_alphanumeric);
    format!(
        "{}{}{}",
        if starts_word { r"\b" } else { "" },
        regex::escape(term),
        if ends_word { r"\b" } else { "" }
    )
}

/// All skill candidates found in `text`, in first-seen order.
pub fn generate_candidates(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    lexicon_terms(text)
        .into_iter()
        .chain(cue_phrases(text))
        .chain(section_items(text))
        .filter(|candidate| seen.insert(normalize_text(candidate)))
        .collect()
}

fn lexicon_terms(text: &str) -> Vec<String> {
    LEXICON_RE
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn cue_phrases(text: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = CUE_PATTERNS
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|caps| caps.get(1))
        .map(|m| (m.start(), m.as_str().trim().to_string()))
        .filter(|(_, phrase)| is_plausible_phrase(phrase, 3, 80))
        .collect();
    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, phrase)| phrase).collect()
}

fn section_items(text: &str) -> Vec<String> {
    SECTION_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .flat_map(|list| LIST_SEPARATOR_RE.split(list.as_str()))
        .map(|item| item.trim().trim_end_matches('.').trim().to_string())
        .filter(|item| is_plausible_phrase(item, 0, 41))
        .filter(|item| item.chars().count() > 1 || item.chars().all(char::is_alphabetic))
        .filter(|item| !item.chars().all(|c| c.is_ascii_digit()))
        .collect()
}

/// `min_exclusive < chars < max_exclusive` and at most four words.
fn is_plausible_phrase(phrase: &str, min_exclusive: usize, max_exclusive: usize) -> bool {
    let chars = phrase.chars().count();
    chars > min_exclusive && chars < max_exclusive && phrase.split_whitespace().count() <= 4
}
