use std::array;

use crate::workflows::assessment::domain::{NarrativeAxis, Pattern, Polarity};

/// Pre-authored fragment table keyed by pattern x axis x polarity. The
/// builtin table ships complete; individual entries can be replaced for
/// deployments that license alternative wording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentLibrary {
    fragments: [[[String; Polarity::COUNT]; NarrativeAxis::COUNT]; Pattern::COUNT],
}

impl FragmentLibrary {
    pub fn builtin() -> Self {
        let fragments = array::from_fn(|p| {
            array::from_fn(|a| {
                array::from_fn(|q| {
                    builtin_fragment(
                        Pattern::ordered()[p],
                        NarrativeAxis::ordered()[a],
                        Polarity::ordered()[q],
                    )
                    .to_string()
                })
            })
        });

        Self { fragments }
    }

    pub fn fragment(&self, pattern: Pattern, axis: NarrativeAxis, polarity: Polarity) -> &str {
        &self.fragments[pattern.index()][axis.index()][polarity.index()]
    }

    pub fn set_fragment(
        &mut self,
        pattern: Pattern,
        axis: NarrativeAxis,
        polarity: Polarity,
        text: impl Into<String>,
    ) {
        self.fragments[pattern.index()][axis.index()][polarity.index()] = text.into();
    }
}

impl Default for FragmentLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

const fn builtin_fragment(pattern: Pattern, axis: NarrativeAxis, polarity: Polarity) -> &'static str {
    use NarrativeAxis::{Personal, Professional, Relationships};
    use Polarity::{Pain, Resource};

    match (pattern, axis, polarity) {
        (Pattern::Criativo, Personal, Pain) => {
            "Under pressure the creative pattern leaves the body and takes refuge in ideas: \
             sleep and meals lose their rhythm while the mind runs, and the subject starts to \
             feel like a visitor in their own routine."
        }
        (Pattern::Criativo, Personal, Resource) => {
            "As a resource, the same sensitivity becomes a fine instrument: the subject notices \
             subtle shifts in their own state early, and imagination turns into concrete \
             self-care strategies that nobody had to prescribe."
        }
        (Pattern::Criativo, Relationships, Pain) => {
            "In close bonds the creative pattern withdraws before the other has even answered; \
             absence is chosen over possible rejection, and partners read the silence as \
             coldness rather than fear."
        }
        (Pattern::Criativo, Relationships, Resource) => {
            "When it feels safe, this pattern brings a rare depth of contact: it perceives what \
             is unspoken in the other and offers an original, unhurried intimacy that does not \
             need constant company to stay loyal."
        }
        (Pattern::Criativo, Professional, Pain) => {
            "At work the ideas arrive faster than the deliveries: projects are abandoned at \
             eighty percent and deadlines feel like invasions, so the subject is seen as \
             brilliant but unreliable."
        }
        (Pattern::Criativo, Professional, Resource) => {
            "Professionally the pattern is the team's source of alternatives: where others see \
             a blocked path it sees three new ones, and given room to conceive before \
             executing it anchors innovation."
        }
        (Pattern::Conectivo, Personal, Pain) => {
            "The connective pattern postpones its own needs until the body protests: tiredness \
             and a vague emptiness appear whenever there is nobody around to care for."
        }
        (Pattern::Conectivo, Personal, Resource) => {
            "In resource, caring turns inward without guilt: the subject learns that receiving \
             nourishment, whether food, rest or affection, is not weakness, and their warmth \
             becomes self-sustaining."
        }
        (Pattern::Conectivo, Relationships, Pain) => {
            "In relationships the fear of being left does the talking: the pattern clings, \
             anticipates abandonment, and asks for reassurance so often that it can exhaust \
             exactly the closeness it needs."
        }
        (Pattern::Conectivo, Relationships, Resource) => {
            "At its best this is the pattern that keeps people together: it remembers what \
             matters to each person and feeds the bond daily, and others feel genuinely \
             received in its presence."
        }
        (Pattern::Conectivo, Professional, Pain) => {
            "Professionally the pattern says yes to every request in order to stay liked, \
             accumulates other people's tasks, and quietly resents that nobody offers the same \
             support back."
        }
        (Pattern::Conectivo, Professional, Resource) => {
            "In resource it is the natural integrator: colleagues bring it their conflicts and \
             teams cohere around it, because someone is finally attending to the human side of \
             delivery."
        }
        (Pattern::Forte, Personal, Pain) => {
            "The strong pattern carries until the structure complains: tension accumulates in \
             silence, pleasure is postponed as a luxury, and the body reads every day as \
             another load to be endured."
        }
        (Pattern::Forte, Personal, Resource) => {
            "In resource, endurance becomes vitality: the same capacity to bear weight turns \
             into stamina for what the subject actually chooses, and slowing down stops \
             feeling like defeat."
        }
        (Pattern::Forte, Relationships, Pain) => {
            "In bonds this pattern swallows discontent to avoid conflict until it overflows \
             sideways, as sarcasm, stubbornness or a sudden distance the partner never saw \
             coming."
        }
        (Pattern::Forte, Relationships, Resource) => {
            "When expressed, its loyalty is structural: this is the person who stays, who \
             holds difficult moments without dramatizing, and who gives relationships a ground \
             that survives storms."
        }
        (Pattern::Forte, Professional, Pain) => {
            "At work it accepts overload as proof of worth: delegating feels like failure, \
             nothing is said until the situation is unsustainable, and feedback lands as one \
             more weight pressing down."
        }
        (Pattern::Forte, Professional, Resource) => {
            "Professionally the pattern is the reliable foundation: long efforts, repetitive \
             phases and crises that demand persistence are exactly where it outlasts everyone \
             else."
        }
        (Pattern::Lider, Personal, Pain) => {
            "The leader pattern treats its own body as a subordinate: fatigue signals are \
             overridden, vulnerability is hidden even from itself, and rest only happens after \
             collapse makes it mandatory."
        }
        (Pattern::Lider, Personal, Resource) => {
            "In resource, command turns into self-direction: intensity is channeled into \
             chosen goals, limits are admitted without being read as defeat, and the energy \
             once spent on vigilance returns."
        }
        (Pattern::Lider, Relationships, Pain) => {
            "In close relationships control replaces trust: the pattern needs the upper hand, \
             tests loyalty instead of opening, and senses betrayal everywhere before it \
             happens."
        }
        (Pattern::Lider, Relationships, Resource) => {
            "At its best it protects fiercely: partners and family live under a presence that \
             resolves and defends, and trust, once finally given, is total."
        }
        (Pattern::Lider, Professional, Pain) => {
            "Professionally the pattern centralizes: delegation feels like risk, colleagues \
             become rivals or instruments, and the team executes out of deference while \
             initiative quietly dies."
        }
        (Pattern::Lider, Professional, Resource) => {
            "In resource it is genuine leadership: scenarios are read fast, responsibility is \
             taken when things fail, and people follow because direction is actually \
             provided."
        }
        (Pattern::Competitivo, Personal, Pain) => {
            "The competitive pattern grades its own life: appearance, performance and even \
             rest become metrics, and the heart stays guarded because feeling too much might \
             cost efficiency."
        }
        (Pattern::Competitivo, Personal, Resource) => {
            "In resource, discipline serves aliveness instead of image: habits align with what \
             the subject loves, and excellence stops demanding the suppression of feeling."
        }
        (Pattern::Competitivo, Relationships, Pain) => {
            "In relationships it competes where it could meet: admiration is demanded rather \
             than intimacy risked, and being right wins arguments while losing closeness."
        }
        (Pattern::Competitivo, Relationships, Resource) => {
            "When open, it brings passion and presence: the intensity that once won trophies \
             shows up as commitment, and the partner gets someone who plays for the \
             relationship instead of against it."
        }
        (Pattern::Competitivo, Professional, Pain) => {
            "At work nothing done is ever enough: the pattern overprepares, fears visible \
             mistakes more than real ones, and reads every colleague's success as a silent \
             defeat."
        }
        (Pattern::Competitivo, Professional, Resource) => {
            "Professionally it raises the level of everything it touches: standards are \
             contagious, execution is elegant, and ambition, once uncoupled from fear, becomes \
             plain competence."
        }
    }
}
