use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Divide,
    ];

    pub fn symbol(&self) -> char {
        match self {
            Operation::Add => '+',
            Operation::Subtract => '-',
            Operation::Multiply => '×',
            Operation::Divide => '÷',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathQuestion {
    pub left: u32,
    pub right: u32,
    pub operation: Operation,
    pub answer: u32,
}

impl MathQuestion {
    /// Whether `input` is the right number. Surrounding whitespace is ignored.
    pub fn check(&self, input: &str) -> bool {
        input.trim().parse::<i64>().is_ok_and(|n| n == self.answer as i64)
    }
}

impl std::fmt::Display for MathQuestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.left, self.operation.symbol(), self.right)
    }
}

/// Operand width for addition and subtraction: 2 digits, one more every
/// third level, at most 4.
pub fn digits_for_level(level: u32) -> u32 {
    (2 + level / 3).min(4)
}

pub fn generate_question<R: Rng + ?Sized>(level: u32, rng: &mut R) -> MathQuestion {
    let operation = Operation::ALL[rng.random_range(0..Operation::ALL.len())];

    let digits = digits_for_level(level);
    let min = 10u32.pow(digits - 1);
    let max = 10u32.pow(digits) - 1;

    let (left, right, answer) = match operation {
        Operation::Add => {
            let left = rng.random_range(min..=max);
            let right = rng.random_range(min..=max);
            (left, right, left + right)
        }
        Operation::Subtract => {
            let left = rng.random_range(min..=max);
            let right = rng.random_range(min..=left);
            (left, right, left - right)
        }
        // times tables up to 12 x 12
        Operation::Multiply => {
            let left = rng.random_range(1..=12);
            let right = rng.random_range(1..=12);
            (left, right, left * right)
        }
        Operation::Divide => {
            let right = rng.random_range(1..=12);
            let answer = rng.random_range(1..=12);
            (right * answer, right, answer)
        }
    };

    MathQuestion { left, right, operation, answer }
}
