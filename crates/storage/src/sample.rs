//! Sample lessons and games loaded by the `seed` binary.

use chrono::{DateTime, Utc};
use learn_core::games::{CardDef, Question};
use learn_core::model::{
    GameConfig, GameError, LessonDraft, LessonError, MemoryConfig, QuizConfig,
};
use thiserror::Error;

use crate::repository::{NewGameRecord, Storage, StorageError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SeedError {
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// What a seeding run actually inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub lessons: usize,
    pub games: usize,
}

const INTRO_CONTENT: &str = r#"
<h2>Qu'est-ce que la programmation ?</h2>
<p>La programmation est l'art d'écrire des instructions que l'ordinateur peut comprendre et exécuter. Ces instructions sont écrites dans un langage de programmation.</p>
<h3>Les concepts de base :</h3>
<ul>
  <li><strong>Variables :</strong> Des conteneurs pour stocker des données</li>
  <li><strong>Fonctions :</strong> Des blocs de code réutilisables</li>
  <li><strong>Conditions :</strong> Des instructions qui s'exécutent selon certaines conditions</li>
  <li><strong>Boucles :</strong> Des instructions qui se répètent</li>
</ul>
<h3>Exemple simple en JavaScript :</h3>
<pre><code>let message = "Bonjour le monde !";
console.log(message);</code></pre>
<p>Dans cet exemple, nous créons une variable appelée <code>message</code> qui contient le texte "Bonjour le monde !", puis nous l'affichons dans la console.</p>
"#;

const VARIABLES_CONTENT: &str = r#"
<h2>Les variables</h2>
<p>Une variable est un nom symbolique qui fait référence à une valeur. En programmation, nous utilisons des variables pour stocker et manipuler des données.</p>
<h3>Déclaration de variables :</h3>
<pre><code>let nom = "Alice";
let age = 25;
let estEtudiant = true;</code></pre>
<h3>Types de données :</h3>
<ul>
  <li><strong>String (chaîne) :</strong> Du texte entre guillemets</li>
  <li><strong>Number (nombre) :</strong> Des nombres entiers ou décimaux</li>
  <li><strong>Boolean (booléen) :</strong> true ou false</li>
  <li><strong>Array (tableau) :</strong> Une liste de valeurs</li>
  <li><strong>Object (objet) :</strong> Une collection de propriétés</li>
</ul>
"#;

const FUNCTIONS_CONTENT: &str = r#"
<h2>Qu'est-ce qu'une fonction ?</h2>
<p>Une fonction est un bloc de code réutilisable qui effectue une tâche spécifique. Elle peut prendre des paramètres en entrée et retourner une valeur.</p>
<h3>Exemple simple :</h3>
<pre><code>function additionner(a, b) {
  return a + b;
}

let resultat = additionner(5, 3); // resultat = 8</code></pre>
<h3>Pourquoi utiliser des fonctions ?</h3>
<ul>
  <li><strong>Réutilisabilité :</strong> Éviter la duplication de code</li>
  <li><strong>Organisation :</strong> Diviser le code en petites parties logiques</li>
  <li><strong>Maintenance :</strong> Plus facile à modifier et déboguer</li>
</ul>
"#;

/// The three introductory programming lessons, in display order.
#[must_use]
pub fn lessons() -> Vec<LessonDraft> {
    [
        (
            "Introduction à la programmation",
            "Découvrez les concepts fondamentaux de la programmation",
            INTRO_CONTENT,
        ),
        (
            "Les variables et types de données",
            "Apprenez à utiliser les variables et comprendre les différents types de données",
            VARIABLES_CONTENT,
        ),
        (
            "Les fonctions",
            "Découvrez comment créer et utiliser des fonctions pour organiser votre code",
            FUNCTIONS_CONTENT,
        ),
    ]
    .into_iter()
    .zip(1_u32..)
    .map(|((title, description, content), order)| LessonDraft {
        title: title.to_owned(),
        description: Some(description.to_owned()),
        content: content.trim().to_owned(),
        order,
    })
    .collect()
}

/// A two-question quiz and a three-pair memory game.
///
/// # Errors
///
/// Returns `GameError` if the built-in questions fail validation.
pub fn games(now: DateTime<Utc>) -> Result<Vec<NewGameRecord>, GameError> {
    let questions = vec![
        Question::new(
            "Qu'est-ce qu'une variable ?",
            vec![
                "Un type de données".into(),
                "Un conteneur pour stocker des données".into(),
                "Une fonction".into(),
                "Une boucle".into(),
            ],
            1,
        )?,
        Question::new(
            "Quel symbole utilise-t-on pour les commentaires en JavaScript ?",
            vec!["//".into(), "/* */".into(), "#".into(), "<!-- -->".into()],
            0,
        )?,
    ];
    let quiz = GameConfig::MultipleChoice(QuizConfig { questions });
    let memory = GameConfig::Memory(MemoryConfig {
        cards: CardDef::pairs(["Variable", "Fonction", "Boucle"]),
    });
    quiz.validate()?;
    memory.validate()?;

    Ok(vec![
        NewGameRecord {
            title: "Quiz de programmation".into(),
            description: Some("Testez vos connaissances en programmation".into()),
            config: quiz,
            created_at: now,
        },
        NewGameRecord {
            title: "Jeu de mémoire".into(),
            description: Some("Mémorisez les concepts de programmation".into()),
            config: memory,
            created_at: now,
        },
    ])
}

/// Load the sample content, skipping lessons or games if any already exist.
///
/// # Errors
///
/// Returns `SeedError` if the samples are invalid or storage fails.
pub async fn seed(storage: &Storage, now: DateTime<Utc>) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    if storage.lessons.list_lessons(false).await?.is_empty() {
        for draft in lessons() {
            let validated = draft.validate(now)?.published();
            storage.lessons.insert_lesson(&validated).await?;
            report.lessons += 1;
        }
    } else {
        tracing::info!("lessons already present, skipping");
    }

    if storage.games.list_games().await?.is_empty() {
        for game in games(now)? {
            storage.games.insert_new_game(game).await?;
            report.games += 1;
        }
    } else {
        tracing::info!("games already present, skipping");
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryRepository, LessonRepository};
    use learn_core::model::{GameKind, Lesson, LessonId, ValidatedLesson};
    use learn_core::time::fixed_now;
    use std::sync::Arc;

    /// Lesson store that accepts inserts but refuses every overwrite.
    struct InsertOnlyLessons(InMemoryRepository);

    #[async_trait::async_trait]
    impl LessonRepository for InsertOnlyLessons {
        async fn insert_lesson(&self, lesson: &ValidatedLesson) -> Result<LessonId, StorageError> {
            self.0.insert_lesson(lesson).await
        }
        async fn update_lesson(&self, _lesson: &Lesson) -> Result<(), StorageError> {
            Err(StorageError::Connection("read only".into()))
        }
        async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
            self.0.get_lesson(id).await
        }
        async fn delete_lesson(&self, id: LessonId) -> Result<(), StorageError> {
            self.0.delete_lesson(id).await
        }
        async fn list_lessons(&self, published_only: bool) -> Result<Vec<Lesson>, StorageError> {
            self.0.list_lessons(published_only).await
        }
    }

    #[tokio::test]
    async fn lessons_are_inserted_already_published() {
        let mut storage = Storage::in_memory();
        storage.lessons = Arc::new(InsertOnlyLessons(InMemoryRepository::new()));

        let report = seed(&storage, fixed_now()).await.unwrap();
        assert_eq!(report.lessons, 3);
        let published = storage.lessons.list_lessons(true).await.unwrap();
        assert_eq!(published.len(), 3);
        assert!(published.iter().all(|l| l.created_at() == l.updated_at()));
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let storage = Storage::in_memory();
        let first = seed(&storage, fixed_now()).await.unwrap();
        assert_eq!(first, SeedReport { lessons: 3, games: 2 });

        let second = seed(&storage, fixed_now()).await.unwrap();
        assert_eq!(second, SeedReport::default());

        let published = storage.lessons.list_lessons(true).await.unwrap();
        assert_eq!(published.len(), 3);
        assert_eq!(published[0].title(), "Introduction à la programmation");
    }

    #[tokio::test]
    async fn sample_games_cover_both_kinds() {
        let storage = Storage::in_memory();
        seed(&storage, fixed_now()).await.unwrap();
        let kinds: Vec<GameKind> = storage
            .games
            .list_games()
            .await
            .unwrap()
            .iter()
            .map(|g| g.kind())
            .collect();
        assert_eq!(kinds, vec![GameKind::MultipleChoice, GameKind::Memory]);
    }
}
