//! Sample people for an empty store.

use rand_core::RngCore;
use roster_core::person::Person;

const FIRST_NAMES: &[&str] = &[
  "Ada", "Bruno", "Carmen", "Dmitri", "Elena", "Farah", "Gustavo", "Hana",
  "Ivan", "Jia", "Kofi", "Lena", "Mateo", "Nadia", "Omar", "Priya", "Quinn",
  "Rosa", "Sven", "Tara", "Umar", "Vera", "Wen", "Yusuf", "Zoe",
];

const LAST_NAMES: &[&str] = &[
  "Almeida", "Brandt", "Castillo", "Dubois", "Eriksen", "Fischer", "Garcia",
  "Haddad", "Ibrahim", "Jensen", "Kowalski", "Lindqvist", "Moreau", "Nakamura",
  "Okafor", "Petrov", "Rossi", "Silva", "Tanaka", "Novak", "Walsh",
];

const VERBS: &[&str] = &[
  "streamline", "orchestrate", "monetize", "reinvent", "scale", "integrate",
  "empower", "harness",
];

const ADJECTIVES: &[&str] = &[
  "scalable", "cross-platform", "real-time", "vertical", "frictionless",
  "distributed", "mission-critical", "seamless",
];

const NOUNS: &[&str] = &[
  "supply chains", "platforms", "paradigms", "workflows", "markets",
  "infrastructures", "partnerships", "channels",
];

const DOMAINS: &[&str] = &["example.com", "example.org", "mail.test", "roster.test"];

fn pick<'a>(rng: &mut impl RngCore, items: &[&'a str]) -> &'a str {
  items[rng.next_u32() as usize % items.len()]
}

/// True with probability `percent / 100`.
fn chance(rng: &mut impl RngCore, percent: u32) -> bool { rng.next_u32() % 100 < percent }

/// One active sample person, created now.
pub fn sample_person(rng: &mut impl RngCore) -> Person {
  let first = pick(rng, FIRST_NAMES);
  let last = pick(rng, LAST_NAMES);

  let description = chance(rng, 50).then(|| {
    format!("{} {} {}", pick(rng, VERBS), pick(rng, ADJECTIVES), pick(rng, NOUNS))
  });
  let email = chance(rng, 60).then(|| {
    format!(
      "{}.{}{}@{}",
      first.to_lowercase(),
      last.to_lowercase(),
      rng.next_u32() % 100,
      pick(rng, DOMAINS)
    )
  });

  Person::new(format!("{first} {last}"), description, email)
}

/// `count` sample people.
pub fn sample_people(rng: &mut impl RngCore, count: usize) -> Vec<Person> {
  (0..count).map(|_| sample_person(rng)).collect()
}

#[cfg(test)]
mod tests {
  use rand_core::OsRng;
  use roster_core::validate::is_valid_email;

  use super::*;

  #[test]
  fn samples_are_active_and_valid() {
    let people = sample_people(&mut OsRng, 200);
    assert_eq!(people.len(), 200);
    for person in &people {
      assert!(person.is_active());
      assert_eq!(person.id, 0);
      assert!(person.name.contains(' '), "{}", person.name);
      if let Some(email) = &person.email {
        assert!(is_valid_email(email), "{email}");
      }
    }
  }

  #[test]
  fn optional_fields_vary() {
    let people = sample_people(&mut OsRng, 200);
    assert!(people.iter().any(|p| p.email.is_some()));
    assert!(people.iter().any(|p| p.email.is_none()));
    assert!(people.iter().any(|p| p.description.is_some()));
  }

  #[test]
  fn zero_count_is_empty() {
    assert!(sample_people(&mut OsRng, 0).is_empty());
  }
}
