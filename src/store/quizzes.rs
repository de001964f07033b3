//! Built-in module quizzes.

use crate::models::QuizQuestion;

struct QuestionSeed {
    module_id: u32,
    question: &'static str,
    options: [&'static str; 4],
    correct_answer: usize,
    explanation: &'static str,
}

const QUESTIONS: &[QuestionSeed] = &[
    QuestionSeed { module_id: 1, question: "Which sign means 'Hello'?", options: ["Hello", "Thank You", "Please", "Goodbye"], correct_answer: 0, explanation: "Correct! This is the JSL sign for 'Hello' - raise your hand to your forehead and move it forward." },
    QuestionSeed { module_id: 1, question: "Which sign means 'Thank You'?", options: ["Please", "Thank You", "Hello", "Goodbye"], correct_answer: 1, explanation: "Correct! Touch your chin with fingertips and move your hand forward to sign 'Thank You'." },
    QuestionSeed { module_id: 1, question: "Which sign means 'Please'?", options: ["Hello", "Goodbye", "Please", "Thank You"], correct_answer: 2, explanation: "Correct! Make a circular motion on your chest with your open hand to sign 'Please'." },
    QuestionSeed { module_id: 1, question: "Which sign means 'Goodbye'?", options: ["Thank You", "Please", "Hello", "Goodbye"], correct_answer: 3, explanation: "Correct! Hold your hand up with palm facing out and close your fingers down in a waving motion." },
    QuestionSeed { module_id: 1, question: "Which sign means 'Excuse Me'?", options: ["Excuse Me", "Hello", "Thank You", "Please"], correct_answer: 0, explanation: "Correct! Gently tap your chest with your fingertips to sign 'Excuse Me'." },
    QuestionSeed { module_id: 2, question: "Which hand shape represents the letter 'A'?", options: ["Closed fist", "Open hand", "Curved hand", "Spread fingers"], correct_answer: 0, explanation: "Correct! The letter 'A' is signed with a closed fist." },
    QuestionSeed { module_id: 2, question: "Which hand shape represents the letter 'B'?", options: ["Closed fist", "Open hand", "Curved hand", "Spread fingers"], correct_answer: 1, explanation: "Correct! The letter 'B' is signed with an open hand." },
    QuestionSeed { module_id: 2, question: "How do you sign the number '1'?", options: ["One finger up", "Two fingers up", "Three fingers up", "All fingers up"], correct_answer: 0, explanation: "Correct! The number '1' is signed with one finger pointing up." },
    QuestionSeed { module_id: 2, question: "How do you sign the number '5'?", options: ["Closed fist", "All fingers spread", "Three fingers up", "Two fingers up"], correct_answer: 1, explanation: "Correct! The number '5' is signed with all fingers spread open." },
    QuestionSeed { module_id: 2, question: "Which hand shape represents the letter 'C'?", options: ["Closed fist", "Open hand", "Curved hand", "Spread fingers"], correct_answer: 2, explanation: "Correct! The letter 'C' is signed with a curved hand shape." },
    QuestionSeed { module_id: 3, question: "Which sign means 'How are you?'", options: ["How are you?", "Hello", "Thank You", "Please"], correct_answer: 0, explanation: "Correct! 'How are you?' requires proper hand movements and facial expressions." },
    QuestionSeed { module_id: 3, question: "Which sign means 'What is your name?'", options: ["How are you?", "What is your name?", "Thank You", "Please"], correct_answer: 1, explanation: "Correct! When asking for a name, use proper hand shape and make eye contact." },
    QuestionSeed { module_id: 3, question: "Which sign means 'Nice to meet you'?", options: ["How are you?", "Hello", "Nice to meet you", "Please"], correct_answer: 2, explanation: "Correct! 'Nice to meet you' combines greeting and appreciation gestures." },
    QuestionSeed { module_id: 3, question: "Which sign means 'Where are you from?'", options: ["How are you?", "Hello", "Thank You", "Where are you from?"], correct_answer: 3, explanation: "Correct! This phrase uses specific hand positions and movements." },
    QuestionSeed { module_id: 3, question: "Which sign means 'I love JSL'?", options: ["How are you?", "Hello", "Thank You", "I love JSL"], correct_answer: 3, explanation: "Correct! This expresses enthusiasm and affection for the language." },
    QuestionSeed { module_id: 4, question: "Which sign means 'I like it'?", options: ["I like it", "Hello", "Thank You", "Please"], correct_answer: 0, explanation: "Correct! 'I like it' is expressed with a thumbs up gesture." },
    QuestionSeed { module_id: 4, question: "Which sign means 'I don't like it'?", options: ["I like it", "I don't like it", "Thank You", "Please"], correct_answer: 1, explanation: "Correct! 'I don't like it' is expressed with a thumbs down gesture." },
    QuestionSeed { module_id: 4, question: "Which sign means 'I'm happy'?", options: ["I'm sad", "I'm confused", "I'm happy", "I'm tired"], correct_answer: 2, explanation: "Correct! 'I'm happy' is shown with a smile and upward hand movements." },
    QuestionSeed { module_id: 4, question: "Which sign means 'I'm sad'?", options: ["I'm sad", "I'm happy", "I'm confused", "I'm tired"], correct_answer: 0, explanation: "Correct! 'I'm sad' is shown with a frown and downward hand movements." },
    QuestionSeed { module_id: 4, question: "Which sign means 'I'm tired'?", options: ["I'm confused", "I'm happy", "I'm sad", "I'm tired"], correct_answer: 3, explanation: "Correct! 'I'm tired' is shown with hands moving downward near the face." },
    QuestionSeed { module_id: 5, question: "Which sign means 'Help'?", options: ["Help", "Hello", "Thank You", "Please"], correct_answer: 0, explanation: "Correct! 'Help' is signed by placing one hand under the other and lifting upward." },
    QuestionSeed { module_id: 5, question: "Which sign means 'Stop'?", options: ["Go", "Stop", "Wait", "Move"], correct_answer: 1, explanation: "Correct! 'Stop' is signed with an open hand held up in front of you." },
    QuestionSeed { module_id: 5, question: "Which sign means 'Go'?", options: ["Stop", "Wait", "Go", "Come"], correct_answer: 2, explanation: "Correct! 'Go' is signed by moving your hand forward with fingers pointing ahead." },
    QuestionSeed { module_id: 5, question: "Which sign means 'Wait'?", options: ["Go", "Stop", "Come", "Wait"], correct_answer: 3, explanation: "Correct! 'Wait' is signed with both hands held up with palms facing forward." },
    QuestionSeed { module_id: 5, question: "Which sign means 'Come'?", options: ["Go", "Stop", "Wait", "Come"], correct_answer: 3, explanation: "Correct! 'Come' is signed by curling your fingers inward in a beckoning motion." },
    QuestionSeed { module_id: 6, question: "Which sign means 'I understand'?", options: ["I understand", "I'm confused", "I agree", "I disagree"], correct_answer: 0, explanation: "Correct! 'I understand' is signed by tapping your forehead with your index finger." },
    QuestionSeed { module_id: 6, question: "Which sign means 'I'm confused'?", options: ["I understand", "I'm confused", "I agree", "I disagree"], correct_answer: 1, explanation: "Correct! 'I'm confused' is signed by moving your hand in a circular motion near your head." },
    QuestionSeed { module_id: 6, question: "Which sign means 'I agree'?", options: ["I understand", "I'm confused", "I agree", "I disagree"], correct_answer: 2, explanation: "Correct! 'I agree' is signed with a nodding motion and thumbs up." },
    QuestionSeed { module_id: 6, question: "Which sign means 'I disagree'?", options: ["I understand", "I agree", "I'm confused", "I disagree"], correct_answer: 3, explanation: "Correct! 'I disagree' is signed with a head shake and thumbs down." },
    QuestionSeed { module_id: 6, question: "Which sign means 'I'm sorry'?", options: ["I'm happy", "I'm confused", "I'm excited", "I'm sorry"], correct_answer: 3, explanation: "Correct! 'I'm sorry' is signed by placing your hand over your heart and moving it in a circular motion." },
];

/// Questions for one module in presentation order; empty for unknown modules.
pub fn module_quiz(module_id: u32) -> Vec<QuizQuestion> {
    QUESTIONS
        .iter()
        .filter(|seed| seed.module_id == module_id)
        .enumerate()
        .map(|(index, seed)| QuizQuestion {
            id: index as u32 + 1,
            question: seed.question.into(),
            options: seed.options.iter().map(|option| option.to_string()).collect(),
            correct_answer: seed.correct_answer,
            explanation: seed.explanation.into(),
        })
        .collect()
}
