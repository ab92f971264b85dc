// src/seed.rs

use chrono::{Days, NaiveTime, Utc};

use crate::{
    error::AppError,
    models::{
        assessment::{
            AnswerOption, CreateAssessmentRequest, Difficulty, Question, QuestionKind, TestCase,
        },
        listing::{Listing, Seller},
        mentor::{DayAvailability, Mentor, SessionType, TimeSlot},
        user::Role,
    },
    state::AppState,
    utils::hash::hash_password,
};

fn choice(id: i64, prompt: &str, points: u32, difficulty: Difficulty, options: &[(&str, &str, bool)]) -> Question {
    Question {
        id,
        prompt: prompt.to_string(),
        points,
        difficulty,
        kind: QuestionKind::Choice {
            multiple: options.iter().filter(|(_, _, correct)| *correct).count() > 1,
            options: options
                .iter()
                .map(|(id, text, is_correct)| AnswerOption {
                    id: id.to_string(),
                    text: text.to_string(),
                    is_correct: *is_correct,
                })
                .collect(),
        },
    }
}

fn test_case(id: &str, input: &str, expected_output: &str, is_hidden: bool) -> TestCase {
    TestCase {
        id: id.to_string(),
        input: input.to_string(),
        expected_output: expected_output.to_string(),
        is_hidden,
    }
}

fn demo_assessments() -> Vec<CreateAssessmentRequest> {
    vec![
        CreateAssessmentRequest {
            title: "Rust Fundamentals".to_string(),
            description: "Ownership, borrowing and the standard collections.".to_string(),
            skill: "rust".to_string(),
            questions: vec![
                choice(
                    1,
                    "Which keyword makes a binding mutable?",
                    10,
                    Difficulty::Easy,
                    &[("a", "mut", true), ("b", "var", false), ("c", "let", false)],
                ),
                choice(
                    2,
                    "Which of these types implement Copy?",
                    20,
                    Difficulty::Medium,
                    &[("a", "i32", true), ("b", "String", false), ("c", "bool", true), ("d", "Vec<u8>", false)],
                ),
                Question {
                    id: 3,
                    prompt: "Write a function that returns the sum of a slice of i32.".to_string(),
                    points: 30,
                    difficulty: Difficulty::Medium,
                    kind: QuestionKind::Coding {
                        language: "rust".to_string(),
                        starter_code: "fn sum(values: &[i32]) -> i32 {\n    todo!()\n}\n".to_string(),
                        test_cases: vec![
                            test_case("t1", "[1, 2, 3]", "6", false),
                            test_case("t2", "[]", "0", false),
                            test_case("t3", "[-5, 5, 10]", "10", true),
                        ],
                    },
                },
            ],
            total_points: Some(60),
            passing_score: 70,
            time_limit_minutes: 20,
        },
        CreateAssessmentRequest {
            title: "Web Basics".to_string(),
            description: "HTTP semantics every backend engineer should know.".to_string(),
            skill: "http".to_string(),
            questions: vec![
                choice(
                    1,
                    "Which status code means the resource was created?",
                    10,
                    Difficulty::Easy,
                    &[("a", "200", false), ("b", "201", true), ("c", "204", false)],
                ),
                choice(
                    2,
                    "Which methods are idempotent?",
                    10,
                    Difficulty::Medium,
                    &[("a", "GET", true), ("b", "PUT", true), ("c", "POST", false), ("d", "DELETE", true)],
                ),
            ],
            total_points: None,
            passing_score: 50,
            time_limit_minutes: 10,
        },
    ]
}

fn demo_listings() -> Vec<Listing> {
    let now = Utc::now();
    let listing = |title: &str, category: &str, price: i64, rating: f32, reviews: u32, level: &str, tags: &[&str], seller: &str, days_old: u64| Listing {
        id: 0,
        title: title.to_string(),
        description: format!("{} with a verified completion certificate.", title),
        category: category.to_string(),
        price,
        rating,
        review_count: reviews,
        skill_level: level.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        seller: Seller {
            user_id: None,
            name: seller.to_string(),
            verified: true,
        },
        image_url: None,
        created_at: now - Days::new(days_old),
    };

    vec![
        listing("Async Rust in Practice", "programming", 120, 4.8, 210, "advanced", &["rust", "tokio"], "Ferris Academy", 3),
        listing("SQL for Analysts", "data", 60, 4.3, 95, "beginner", &["sql", "postgres"], "DataWorks", 10),
        listing("Kubernetes Operations", "devops", 150, 4.6, 140, "intermediate", &["k8s", "containers"], "CloudGuild", 1),
        listing("Product Design Sprint", "design", 80, 4.1, 40, "beginner", &["ux", "figma"], "Studio North", 20),
        listing("Machine Learning Foundations", "data", 200, 4.9, 320, "intermediate", &["python", "ml"], "DataWorks", 6),
        listing("Secure Web APIs", "programming", 90, 4.5, 75, "intermediate", &["security", "http"], "Ferris Academy", 14),
    ]
}

fn demo_mentors() -> Vec<Mentor> {
    let today = Utc::now().date_naive();
    let hour = |h: u32| NaiveTime::from_hms_opt(h, 0, 0).unwrap_or(NaiveTime::MIN);

    let availability = |hours: &[u32]| -> Vec<DayAvailability> {
        (1..=3)
            .map(|offset| DayAvailability {
                date: today + Days::new(offset),
                slots: hours
                    .iter()
                    .map(|&h| TimeSlot {
                        id: format!("{:02}00", h),
                        start: hour(h),
                        end: hour(h + 1),
                        is_booked: false,
                    })
                    .collect(),
            })
            .collect()
    };

    vec![
        Mentor {
            id: 0,
            name: "Ada Park".to_string(),
            title: "Staff Engineer".to_string(),
            bio: "Builds distributed storage systems in Rust.".to_string(),
            expertise: vec!["rust".to_string(), "systems".to_string()],
            hourly_rate: 120,
            rating: 4.9,
            review_count: 88,
            session_types: vec![SessionType::Video, SessionType::Chat],
            availability: availability(&[9, 10, 14]),
        },
        Mentor {
            id: 0,
            name: "Luis Romero".to_string(),
            title: "Data Scientist".to_string(),
            bio: "Helps analysts move into machine learning.".to_string(),
            expertise: vec!["python".to_string(), "ml".to_string(), "sql".to_string()],
            hourly_rate: 90,
            rating: 4.7,
            review_count: 52,
            session_types: vec![SessionType::Video, SessionType::Voice],
            availability: availability(&[11, 15]),
        },
        Mentor {
            id: 0,
            name: "Mina Okafor".to_string(),
            title: "Platform Lead".to_string(),
            bio: "Kubernetes, CI pipelines and on-call culture.".to_string(),
            expertise: vec!["devops".to_string(), "kubernetes".to_string()],
            hourly_rate: 100,
            rating: 4.7,
            review_count: 61,
            session_types: vec![SessionType::Chat],
            availability: availability(&[8, 16, 17]),
        },
    ]
}

/// Populates the assessment catalog, marketplace and mentor directory.
pub fn load_demo_catalog(state: &AppState) -> Result<(), AppError> {
    for request in demo_assessments() {
        state.assessments.create(request)?;
    }
    for listing in demo_listings() {
        state.marketplace.add_listing(listing);
    }
    for mentor in demo_mentors() {
        state.mentors.add_mentor(mentor);
    }

    tracing::info!(
        assessments = state.assessments.list().len(),
        listings = state.marketplace.listings().len(),
        mentors = state.mentors.list().len(),
        "Demo catalog loaded"
    );
    Ok(())
}

/// Creates the admin account from `ADMIN_USERNAME`/`ADMIN_PASSWORD` when both are set.
pub fn seed_admin_user(state: &AppState) -> Result<(), AppError> {
    let (Some(username), Some(password)) = (&state.config.admin_username, &state.config.admin_password) else {
        return Ok(());
    };

    if state.users.find_by_username(username).is_some() {
        return Ok(());
    }

    tracing::info!("Seeding admin user: {}", username);
    let hashed_password = hash_password(password)?;
    let admin = state.users.insert(username, hashed_password, Role::Admin)?;
    state.marketplace.open_wallet(admin.id, state.config.starter_credits);
    tracing::info!("Admin user created successfully.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_assessments_are_valid() {
        for (i, request) in demo_assessments().into_iter().enumerate() {
            let title = request.title.clone();
            assert!(request.into_assessment(i as i64 + 1, Utc::now()).is_ok(), "{}", title);
        }
    }

    #[test]
    fn test_demo_mentors_have_future_slots() {
        let today = Utc::now().date_naive();
        for mentor in demo_mentors() {
            assert!(mentor.open_slot_count() > 0);
            assert!(mentor.availability.iter().all(|d| d.date > today));
        }
    }
}
