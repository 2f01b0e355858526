//! Prompt templates for interview generation
//!
//! Every prompt ends with an example JSON object and instructs the model to
//! answer with that object only; the gateway depends on this contract.

use crate::types::{Level, QaPair};

/// Topic scope for a role, used to keep questions inside the role's domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDomain {
    pub domain: String,
    pub scope: String,
    pub forbidden: String,
    pub examples: Vec<String>,
}

struct CuratedDomain {
    role: &'static str,
    domain: &'static str,
    scope: &'static str,
    forbidden: &'static str,
    examples: [&'static str; 3],
}

const ROLE_DOMAINS: &[CuratedDomain] = &[
    CuratedDomain {
        role: "Frontend Developer",
        domain: "frontend web development",
        scope: "HTML, CSS, JavaScript, React, Angular, Vue, state management, component architecture, browser rendering, responsive design, accessibility, and frontend performance optimization",
        forbidden: "Do NOT ask about backend architecture, database schema design, server-side scaling, DevOps, or Salesforce.",
        examples: [
            "How does the virtual DOM work in React?",
            "What is the difference between CSS Grid and Flexbox?",
            "Explain how React hooks manage component state.",
        ],
    },
    CuratedDomain {
        role: "Backend Developer",
        domain: "backend development and server-side engineering",
        scope: "Node.js, Express, REST APIs, authentication (JWT, OAuth), SQL and NoSQL databases, caching, microservices, system design, error handling, logging, server security, and backend performance",
        forbidden: "Do NOT ask about CSS styling, UI/UX design, frontend frameworks, or Salesforce.",
        examples: [
            "What is the difference between SQL and NoSQL databases?",
            "How does JWT authentication work?",
            "Explain the concept of middleware in Express.js.",
        ],
    },
    CuratedDomain {
        role: "Full Stack Developer",
        domain: "full-stack web development spanning frontend and backend",
        scope: "frontend-backend integration, REST/GraphQL APIs, database-UI workflows, end-to-end authentication, deployment, CI/CD, cross-layer performance, state management, real-time communication, and moderate system design",
        forbidden: "Do NOT ask isolated frontend-only or backend-only trivia. Questions must test cross-layer understanding. Do NOT ask about Salesforce.",
        examples: [
            "How would you design the authentication flow from login form to protected API endpoint?",
            "Explain how you would connect a React frontend to a REST API with proper error handling.",
            "What strategies would you use to optimize performance across both client and server?",
        ],
    },
    CuratedDomain {
        role: "Salesforce Developer",
        domain: "Salesforce platform development",
        scope: "Apex programming, SOQL, SOSL, triggers, Lightning Web Components (LWC), Salesforce architecture, governor limits, Flows, Process Builder, REST/SOAP integration on Salesforce, security and sharing rules, data model, batch Apex, and Visualforce",
        forbidden: "Do NOT ask about generic React, Node.js, Python, or non-Salesforce system design.",
        examples: [
            "What are governor limits in Salesforce and why do they matter?",
            "Explain the difference between before and after triggers in Apex.",
            "How does the Lightning Web Components event model work?",
        ],
    },
    CuratedDomain {
        role: "Software Engineer",
        domain: "core software engineering and computer science fundamentals",
        scope: "data structures, algorithms, object-oriented design, system design, concurrency, design patterns, code quality, refactoring, version control, testing strategies, complexity analysis, and distributed systems basics",
        forbidden: "Do NOT ask about specific frameworks (React, Angular), UI design, or Salesforce. Focus on language-agnostic engineering principles.",
        examples: [
            "What is the time complexity of binary search?",
            "Explain the SOLID principles in object-oriented design.",
            "How would you design a URL shortening service?",
        ],
    },
    CuratedDomain {
        role: "Data Scientist",
        domain: "data science, machine learning, and statistical analysis",
        scope: "Python for data science, machine learning algorithms, statistics, deep learning, data analysis, SQL for analytics, TensorFlow, PyTorch, data visualization, feature engineering, model evaluation, big data concepts, and NLP",
        forbidden: "Do NOT ask about frontend development, CSS, backend APIs, or Salesforce.",
        examples: [
            "What is the difference between supervised and unsupervised learning?",
            "Explain the bias-variance tradeoff.",
            "How would you handle missing values in a dataset?",
        ],
    },
    CuratedDomain {
        role: "Product Manager",
        domain: "product management and strategy",
        scope: "product strategy, roadmap planning, user research, market analysis, agile methodologies, stakeholder management, metrics/KPIs, go-to-market strategy, competitive analysis, product lifecycle, prioritization frameworks, and experimentation",
        forbidden: "Do NOT ask about coding, technical implementation details, or specific programming languages.",
        examples: [
            "How would you prioritize features for a new product launch?",
            "What metrics would you track to measure product success?",
            "Describe how you would conduct user research for a B2B product.",
        ],
    },
    CuratedDomain {
        role: "Designer",
        domain: "UI/UX design and user experience",
        scope: "UI/UX principles, Figma, design tools, user research methods, wireframing, prototyping, design systems, accessibility standards, visual hierarchy, typography, interaction design, responsive layouts, design thinking, usability testing, and motion design",
        forbidden: "Do NOT ask about backend architecture, database design, algorithms, or Salesforce.",
        examples: [
            "What is the difference between UX and UI design?",
            "How would you approach designing a mobile-first experience?",
            "Explain the principles of visual hierarchy.",
        ],
    },
];

impl RoleDomain {
    /// Look up the curated domain for a role, or derive a generic one.
    ///
    /// The generic fallback carries no curated forbidden-topic list.
    pub fn for_role(role: &str) -> Self {
        match ROLE_DOMAINS.iter().find(|d| d.role == role) {
            Some(d) => Self {
                domain: d.domain.to_string(),
                scope: d.scope.to_string(),
                forbidden: d.forbidden.to_string(),
                examples: d.examples.iter().map(|e| e.to_string()).collect(),
            },
            None => Self {
                domain: role.to_lowercase(),
                scope: format!("topics relevant to the {} position", role),
                forbidden: "Stay within the scope of the role.".to_string(),
                examples: vec!["Ask a relevant, focused question for this role.".to_string()],
            },
        }
    }

    /// Whether the role has a curated entry
    pub fn is_curated(role: &str) -> bool {
        ROLE_DOMAINS.iter().any(|d| d.role == role)
    }

    fn example_lines(&self) -> String {
        self.examples
            .iter()
            .map(|e| format!("- \"{}\"", e))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Input for the initial question prompt
#[derive(Debug, Clone)]
pub struct InitialQuestionInput<'a> {
    pub role: &'a str,
    pub level: Level,
    pub topics: &'a [String],
}

/// Input for the answer evaluation prompt
#[derive(Debug, Clone)]
pub struct EvaluationInput<'a> {
    pub question: &'a str,
    pub answer: &'a str,
    pub expected_key_points: &'a [String],
    pub role: &'a str,
}

/// Input for the follow-up question prompt
#[derive(Debug, Clone)]
pub struct FollowUpInput<'a> {
    pub role: &'a str,
    pub level: Level,
    pub history: &'a str,
    pub last_score: u8,
    pub topics_covered: &'a [String],
    pub uncovered_topics: &'a [String],
}

/// Input for the final report prompt
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    pub role: &'a str,
    pub level: Level,
    pub qa_pairs: &'a [QaPair],
    pub duration_secs: u64,
}

/// How the next question's difficulty should move after a scored answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyAdjustment {
    Increase,
    Maintain,
    Simplify,
}

impl DifficultyAdjustment {
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            Self::Increase
        } else if score >= 60 {
            Self::Maintain
        } else {
            Self::Simplify
        }
    }

    fn instruction(&self) -> &'static str {
        match self {
            Self::Increase => "- The candidate did well. INCREASE difficulty or go deeper.",
            Self::Maintain => {
                "- The candidate showed decent understanding. MAINTAIN current difficulty."
            }
            Self::Simplify => {
                "- The candidate struggled. Ask a SIMPLER question to assess fundamentals."
            }
        }
    }
}

/// Prompt builder for the four interview tasks
pub struct PromptBuilder;

impl PromptBuilder {
    /// Prompt for the first question of a session
    pub fn initial_question(input: &InitialQuestionInput<'_>) -> String {
        let rd = RoleDomain::for_role(input.role);
        let topics = input.topics.join(", ");

        format!(
            r#"You are an expert interviewer conducting a {level} level interview for a {role} position.
Your domain: {domain}.

Context:
- Role: {role}
- Experience Level: {level}
- Focus Topics: {topics}
- Allowed Scope: {scope}

STRICT DOMAIN RULES:
- ONLY ask questions about: {scope}
- {forbidden}
- Choose your question topic from: {topics}

QUESTION REQUIREMENTS:
1. Ask a SHORT, FOCUSED question (1-2 sentences max)
2. ONE clear topic only
3. Appropriate difficulty for {level} level
4. Can be answered in 1-2 minutes
5. No compound questions

EXAMPLES OF GOOD QUESTIONS FOR {role_upper}:
{examples}

CRITICAL: You MUST respond with ONLY valid JSON. No other text.

{{
  "question": "Your SHORT interview question here (1-2 sentences max)",
  "type": "technical",
  "difficulty": 3,
  "expectedKeyPoints": ["key point 1", "key point 2", "key point 3"]
}}"#,
            level = input.level,
            role = input.role,
            role_upper = input.role.to_uppercase(),
            domain = rd.domain,
            scope = rd.scope,
            forbidden = rd.forbidden,
            topics = topics,
            examples = rd.example_lines(),
        )
    }

    /// Prompt for scoring a single answer
    pub fn evaluate_answer(input: &EvaluationInput<'_>) -> String {
        let rd = RoleDomain::for_role(input.role);

        format!(
            r#"You are evaluating an answer in a {role} interview.
Domain: {domain}.

Question: "{question}"
Expected: {expected}
Answer: "{answer}"

SCORING RULES (IMPORTANT):
1. If answer is WRONG or talks about something else = 0-20
2. If answer is too vague or lacks details = 30-50
3. If answer is partially correct but incomplete = 55-70
4. If answer is mostly correct with good details = 70-85
5. If answer is excellent and comprehensive = 85-100

CHECK: Does the answer actually address the question?
- If NO → score must be 0-25
- If answer is off-topic → score must be 0-15

Evaluate strictly within the {domain} context. Assess whether the candidate demonstrates real {role} knowledge.

Return ONLY JSON:
{{
  "score": 60,
  "feedback": "Brief honest feedback",
  "strengths": ["strength1", "strength2"],
  "improvements": ["improve1", "improve2"],
  "keyPointsCovered": ["point1"]
}}"#,
            role = input.role,
            domain = rd.domain,
            question = input.question,
            expected = input.expected_key_points.join(", "),
            answer = input.answer,
        )
    }

    /// Prompt for the next question, adapted to the last score and topic coverage
    pub fn follow_up(input: &FollowUpInput<'_>) -> String {
        let rd = RoleDomain::for_role(input.role);

        let uncovered_line = if input.uncovered_topics.is_empty() {
            String::new()
        } else {
            format!(
                "Topics Not Yet Covered: {}",
                input.uncovered_topics.join(", ")
            )
        };

        let topic_instruction = if input.uncovered_topics.is_empty() {
            "- Deepen the current topic with a follow-up.".to_string()
        } else {
            let candidates: Vec<&str> = input
                .uncovered_topics
                .iter()
                .take(2)
                .map(String::as_str)
                .collect();
            format!(
                "- Explore one of these uncovered topics: {}",
                candidates.join(" or ")
            )
        };

        format!(
            r#"You are continuing a {level} level interview for a {role} position.
Your domain: {domain}.

Recent Conversation:
{history}

Last Answer Score: {score}/100

Topics Already Covered: {covered}
{uncovered_line}

STRICT DOMAIN RULES:
- ONLY ask questions about: {scope}
- {forbidden}
- Stay within the {role} domain. Do NOT cross into other roles.

Instructions for Next Question:
{difficulty}
{topic_instruction}

QUESTION REQUIREMENTS:
1. Ask a SHORT, FOCUSED question (1-2 sentences max)
2. ONE clear topic only, from the {role} domain
3. No compound or multi-part questions
4. Direct and simple phrasing
5. Can be answered in 1-2 minutes

EXAMPLES OF GOOD QUESTIONS FOR {role_upper}:
{examples}

CRITICAL: You MUST respond with ONLY valid JSON. No other text.

{{
  "question": "Your SHORT follow-up question here (1-2 sentences max)",
  "type": "technical",
  "difficulty": 4,
  "expectedKeyPoints": ["key point 1", "key point 2", "key point 3"]
}}"#,
            level = input.level,
            role = input.role,
            role_upper = input.role.to_uppercase(),
            domain = rd.domain,
            history = input.history,
            score = input.last_score,
            covered = input.topics_covered.join(", "),
            uncovered_line = uncovered_line,
            scope = rd.scope,
            forbidden = rd.forbidden,
            difficulty = DifficultyAdjustment::from_score(input.last_score).instruction(),
            topic_instruction = topic_instruction,
            examples = rd.example_lines(),
        )
    }

    /// Prompt for the final scored report
    pub fn report(input: &ReportInput<'_>) -> String {
        let rd = RoleDomain::for_role(input.role);

        let history = input
            .qa_pairs
            .iter()
            .enumerate()
            .map(|(i, qa)| {
                format!(
                    "Q{n}: {q}\nA{n}: {a}\nScore: {s}/100\n",
                    n = i + 1,
                    q = qa.question,
                    a = qa.answer,
                    s = qa.score
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let minutes = (input.duration_secs as f64 / 60.0).round() as u64;

        format!(
            r#"Generate a comprehensive interview performance report for a {role} candidate.
Domain evaluated: {domain}.

Interview Details:
- Role: {role}
- Level: {level}
- Duration: {minutes} minutes
- Questions Asked: {count}

Complete Q&A History:
{history}

Your Task:
Analyze the candidate's performance specifically as a {role}. Provide:
1. An overall score (0-100) representing interview performance
2. A summary paragraph (3-4 sentences) describing overall performance as a {role}
3. Category scores for: technical depth, communication clarity, problem-solving approach
4. Top 3 specific strengths demonstrated
5. Top 3 specific areas for improvement
6. 3 actionable recommendations for next steps as a {role}

Be fair, specific, and constructive. Frame feedback in the context of the {role} role.

CRITICAL: You MUST respond with ONLY valid JSON. No other text.

{{
  "overallScore": 78,
  "summary": "A 3-4 sentence paragraph summarizing the candidate's overall performance as a {role}.",
  "categoryScores": {{
    "technical": 80,
    "communication": 75,
    "problemSolving": 78
  }},
  "strengths": [
    "Specific strength with example from interview",
    "Another specific strength with example",
    "Third specific strength with example"
  ],
  "improvements": [
    "Specific area to improve with actionable advice",
    "Another area with concrete suggestion",
    "Third area with clear next step"
  ],
  "recommendations": [
    "Actionable recommendation 1",
    "Actionable recommendation 2",
    "Actionable recommendation 3"
  ]
}}"#,
            role = input.role,
            domain = rd.domain,
            level = input.level,
            minutes = minutes,
            count = input.qa_pairs.len(),
            history = history,
        )
    }
}
