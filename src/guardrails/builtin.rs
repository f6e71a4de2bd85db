//! Pattern data shipped with the crate.
//!
//! Topic patterns catch other fruits (in several languages) and talk about rules;
//! injection patterns catch attempts to override the system prompt.

/// Fruit names and rule vocabulary, one pattern per language group.
pub const TOPIC_PATTERNS: &[&str] = &[
    // English fruits
    r#"\b(?i:oranges?|apples?|cranberr(?:y|ies)|pineapples?|grapes?|strawberr(?:y|ies)|blueberr(?:y|ies)|watermelons?|durians?|cloudberr(?:y|ies)|bananas?|mangoes?|peaches?|pears?|plums?|cherr(?:y|ies)|kiwifruits?|kiwis?|papayas?|avocados?|coconuts?|raspberr(?:y|ies)|blackberr(?:y|ies)|pomegranates?|figs?|dates?|apricots?|nectarines?|tangerines?|clementines?|grapefruits?|lime|passionfruits?|dragonfruits?|lychees?|guavas?|persimmons?)\b"#,
    // Turkish fruits
    r#"\b(?i:portakals?|elmalar?|kızılcık(?:lar)?|ananaslar?|üzümler?|çilek(?:ler)?|yaban mersin(?:leri)?|karpuzlar?|durianlar?|bulutot(?:u|ları)?|muzlar?|mango(?:lar)?|şeftaliler?|armutlar?|erikler?|kiraz(?:lar)?|kiviler?|papayalar?|avokadolar?|hindistan cevizi(?:ler)?|ahududular?|böğürtlen(?:ler)?|nar(?:lar)?|incir(?:ler)?|hurmalar?|kayısı(?:lar)?|nektarin(?:ler)?|mandalina(?:lar)?|klementin(?:ler)?|greyfurt(?:lar)?|lime(?:lar)?|passionfruit(?:lar)?|ejder meyvesi(?:ler)?|liçi(?:ler)?|hurma(?:lar)?)\b"#,
    // Swedish fruits
    r#"\b(?i:apelsin(?:er)?|äpple(?:n)?|tranbär(?:en)?|ananas(?:er)?|druv(?:a|or)?|jordgubb(?:e|ar)?|blåbär(?:en)?|vattenmelon(?:er)?|durian(?:er)?|hjortron(?:en)?|banan(?:er)?|mango(?:r)?|persika(?:or)?|päron(?:en)?|plommon(?:en)?|körsbär(?:en)?|kiwi(?:er)?|papaya(?:or)?|avokado(?:r)?|kokosnöt(?:ter)?|hallon(?:en)?|björnbär(?:en)?|granatäpple(?:n)?|fikon(?:en)?|dadel(?:ar)?|aprikos(?:er)?|nektarin(?:er)?|mandarin(?:er)?|klementin(?:er)?|grapefrukt(?:er)?|lime(?:r)?|passionsfrukt(?:er)?|drakfrukt(?:er)?|litchi(?:er)?|guava(?:or)?|kaki(?:frukter)?)\b"#,
    // Finnish fruits
    r#"\b(?i:appelsiini(?:t|a|n)?|omena(?:t|a|n)?|karpalo(?:t|ita|n)?|ananas(?:t|ia|en)?|viinirypäle(?:et|itä|en)?|mansikka(?:t|a|n)?|mustikka(?:t|a|n)?|vesimeloni(?:t|a|n)?|durian(?:it|ia|in)?|lakka(?:t|a|n)?|banaani(?:t|a|n)?|mango(?:t|a|n)?|persikka(?:t|a|n)?|päärynä(?:t|ä|n)?|luumu(?:t|ja|n)?|kirsikka(?:t|a|n)?|kiivi(?:t|ä|n)?|papaja(?:t|a|n)?|avokado(?:t|a|n)?|kookospähkinä(?:t|ä|n)?|vadelma(?:t|a|n)?|karhunvatukka(?:t|a|n)?|granaattiomena(?:t|a|n)?|viikuna(?:t|a|n)?|taateli(?:t|a|n)?|aprikoosi(?:t|a|n)?|nektariini(?:t|a|n)?|mandariini(?:t|a|n)?|klementiini(?:t|a|n)?|greippi(?:t|ä|n)?|lime(?:t|ä|n)?|passionhedelmä(?:t|ä|n)?|lohikäärmehedelmä(?:t|ä|n)?|litsi(?:t|ä|n)?|guava(?:t|a|n)?|persimoni(?:t|a|n)?)\b"#,
    // Dutch fruits
    r#"\b(?i:sinaasappel(?:en)?|appel(?:s)?|veenbes(?:sen)?|ananas(?:sen)?|druif(?:fen)?|aardbei(?:en)?|blauwe bes(?:sen)?|watermeloen(?:en)?|durian(?:s)?|honingbes(?:sen)?|banaan(?:en)?|mango(?:'s|s)?|perzik(?:ken)?|peer(?:en)?|pruim(?:en)?|kers(?:en)?|kiwi(?:'s|s)?|papaja(?:'s|s)?|avocado(?:'s|s)?|kokosnoot(?:en)?|framboos(?:zen)?|braam(?:men)?|granaatappel(?:en)?|vijg(?:en)?|dadel(?:s|en)?|abrikoos(?:zen)?|nectarine(?:n)?|mandarijn(?:en)?|clementine(?:n)?|grapefruit(?:s|en)?|limoen(?:en)?|passievrucht(?:en)?|draakvrucht(?:en)?|lychee(?:s|'s)?|guave(?:s|n)?|kaki(?:'s|s)?)\b"#,
    // French fruits
    r#"\b(?i:orange(?:s)?|pomme(?:s)?|canneberge(?:s)?|ananas(?:s)?|raisin(?:s)?|fraise(?:s)?|myrtille(?:s)?|pastèque(?:s)?|durian(?:s)?|airelle(?:s)?|banane(?:s)?|mangue(?:s)?|pêche(?:s)?|poire(?:s)?|prune(?:s)?|cerise(?:s)?|kiwi(?:s)?|papaye(?:s)?|avocat(?:s)?|noix de coco|framboise(?:s)?|mûre(?:s)?|grenade(?:s)?|figue(?:s)?|datte(?:s)?|abricot(?:s)?|nectarine(?:s)?|mandarine(?:s)?|clémentine(?:s)?|pamplemousse(?:s)?|citron vert|fruit de la passion(?:s)?|fruit du dragon(?:s)?|litchi(?:s)?|goyave(?:s)?|kaki(?:s)?)\b"#,
    // Spanish fruits
    r#"\b(?i:naranja(?:s)?|manzana(?:s)?|arándano(?:s)?|piña(?:s)?|uva(?:s)?|fresa(?:s)?|arándano azul(?:es)?|sandía(?:s)?|durian(?:es)?|mora ártica(?:s)?|plátano(?:s)?|mango(?:s)?|melocotón(?:es)?|pera(?:s)?|ciruela(?:s)?|cereza(?:s)?|kiwi(?:s)?|papaya(?:s)?|aguacate(?:s)?|coco(?:s)?|frambuesa(?:s)?|mora(?:s)?|granada(?:s)?|higo(?:s)?|dátil(?:es)?|albaricoque(?:s)?|nectarina(?:s)?|mandarina(?:s)?|clementina(?:s)?|pomelo(?:s)?|lima(?:s)?|fruta de la pasión(?:es)?|fruta del dragón(?:es)?|lichi(?:s)?|guayaba(?:s)?|caqui(?:s)?)\b"#,
    // German fruits
    r#"\b(?i:orange(?:n)?|apfel(?:s)?|preiselbeere(?:n)?|ananas(?:se)?|traube(?:n)?|erdbeere(?:n)?|blaubeere(?:n)?|wassermelone(?:n)?|durian(?:s)?|moltebeere(?:n)?|banane(?:n)?|mango(?:s)?|pfirsich(?:e|en)?|birne(?:n)?|pflaume(?:n)?|kirsche(?:n)?|kiwi(?:s)?|papaya(?:s)?|avocado(?:s)?|kokosnuss(?:e|n)?|himbeere(?:n)?|brombeere(?:n)?|granatapfel(?:¨e|n)?|feige(?:n)?|dattel(?:n)?|aprikose(?:n)?|nektarine(?:n)?|mandarine(?:n)?|klementine(?:n)?|grapefruit(?:s)?|limette(?:n)?|passionsfrucht(?:¨e|en)?|drachenfrucht(?:¨e|en)?|litschi(?:s)?|guave(?:n)?|kaki(?:s)?)\b"#,
    // Japanese fruits
    r#"\b(?i:オレンジ|みかん|リンゴ|クランベリー|パイナップル|ぶどう|イチゴ|ブルーベリー|スイカ|ドリアン|クラウドベリー|バナナ|マンゴー|モモ|ナシ|スモモ|サクランボ|キウイ|パパイヤ|アボカド|ココナッツ|ラズベリー|ブラックベリー|ザクロ|イチジク|ナツメ|アプリコット|ネクタリン|タンジェリン|クレメンタイン|グレープフルーツ|ライム|パッションフルーツ|ドラゴンフルーツ|ライチ|グアバ|柿)\b"#,
    // Russian fruits
    r#"\b(?i:апельсин(?:ы)?|яблоко(?:а|и)?|клюква(?:ы)?|ананас(?:ы)?|виноград(?:ы)?|клубника(?:и)?|черника(?:и)?|арбуз(?:ы)?|дуриан(?:ы)?|морошка(?:и)?|банан(?:ы)?|манго(?:ы)?|персик(?:и)?|груша(?:и)?|слива(?:ы)?|вишня(?:и)?|киви(?:и)?|папайя(?:и)?|авокадо(?:ы)?|кокос(?:ы)?|малина(?:ы)?|ежевика(?:и)?|гранат(?:ы)?|инжир(?:ы)?|финик(?:и)?|абрикос(?:ы)?|нектарин(?:ы)?|мандарин(?:ы)?|клементин(?:ы)?|грейпфрут(?:ы)?|лайм(?:ы)?|маракуйя|драконий фрукт|личи|гуава(?:ы)?|хурма(?:ы)?)\b"#,
    // Italian fruits
    r#"\b(?i:arancia(?:e)?|mela(?:e)?|mirtillo rosso(?:i)?|ananas(?:i)?|uva(?:e)?|fragola(?:e)?|mirtillo(?:i)?|anguria(?:e)?|durian(?:i)?|lampone(?:i)?|banana(?:e)?|mango(?:i)?|pesca(?:he)?|pera(?:e)?|prugna(?:e)?|ciliegia(?:he)?|kiwi(?:s)?|papaya(?:e)?|avocado(?:i)?|cocco(?:i)?|lampone(?:i)?|mora(?:e)?|melograno(?:i)?|fico(?:chi)?|dattero(?:i)?|albicocca(?:he)?|nettarella(?:e)?|mandarino(?:i)?|clementina(?:e)?|pompelmo(?:i)?|lime(?:s)?|frutto della passione(?:i)?|frutto del drago(?:i)?|litchi(?:s)?|guava(?:e)?|cachi?)\b"#,
    // Polish fruits
    r#"\b(?i:pomarańcza(?:e|y)?|jabłko(?:a|i)?|żurawina(?:y)?|ananasy?|winogrono(?:a|a)?|truskawka(?:i|ek)?|jagoda(?:i|y)?|arbuz(?:y)?|durian(?:y)?|moroszka(?:i)?|banan(?:y|ów)?|mango(?:a|i)?|brzoskwinia(?:e|y)?|gruszka(?:i|ek)?|śliwka(?:i|ek)?|wiśnia(?:e|i)?|kiwi(?:i)?|papaja(?:e|y)?|awokado(?:a)?|kokos(?:y)?|malina(?:y)?|jeżyna(?:y)?|granat(?:y)?|figa(?:i)?|daktyl(?:e)?|morela(?:e|y)?|nektaryna(?:y)?|mandarynka(?:i|ek)?|klementynka(?:i|ek)?|grejpfrut(?:y)?|limonka(?:i)?|marakuja(?:e|y)?|smoczy owoc(?:y)?|liczi(?:e)?|guawa(?:y)?|persymona(?:y)?)\b"#,
    // Chinese fruits
    r#"\b(?i:橙子|桔子|苹果|蔓越莓|菠萝|葡萄|草莓|蓝莓|西瓜|榴莲|云莓|香蕉|芒果|桃子|梨|李子|樱桃|猕猴桃|木瓜|牛油果|椰子|覆盆子|黑莓|石榴|无花果|枣|杏|油桃|柑橘|柑橘类|柠檬|百香果|火龙果|荔枝|番石榴|柿子)\b"#,
    // Hindi fruits
    r#"\b(?i:संतरा|ऑरेंज|सेब|क्रैनबेरी|अनानास|अंगूर|स्ट्रॉबेरी|ब्लूबेरी|तरबूज|ड्यूरियन|क्लाउडबेरी|केला|मैंगो|आड़ू|नाशपाती|आलूबुखारा|चेरी|कीवी|पपीता|एवोकाडो|नारियल|रास्पबेरी|ब्लैकबेरी|अनार|अंजीर|खजूर|खुबानी|नेकटेरिन|मंडारिन|क्लेमेंटाइन|ग्रेपफ्रूट|नींबू|पासनफ्रूट|ड्रैगन फ्रूट|लीची|अमरूद|तेंदू)\b"#,
    // Instruction/rule keywords
    r#"\b(?i:instruction|instructions|rule|rules|prompt|policy|policies|system message|system messages|guideline|guidelines|command|commands|directive|directives)\b"#,
];

/// Phrasings typical of prompt-injection attempts.
pub const INJECTION_PATTERNS: &[&str] = &[
    r#"(?i)\b(ignore|disregard|override|bypass|forget)\b.*\b(previous|above|earlier|system|developer|guardrail|rules?|instructions?)\b"#,
    r#"(?i)\b(this is (the )?only rule|the only rule|new rules?|replace (all )?rules?)\b"#,
    r#"(?i)\b(from now on|starting now|effective immediately)\b"#,
    r#"(?i)\b(act as|pretend to be|role-?play as|jailbreak|devmode)\b"#,
    r#"(?i)\b(do not|don't)\s+(say|write|mention|use)\b"#,
    r#"(?i)\byou (now )?understand\b.*\b(turkish|swedish|german|french|finnish|all languages)\b"#,
    r#"(?i)\b(new system prompt|override (the )?system|ignore safety)\b"#,
    r#"(?i)^\s*(rule|instruction|policy|system)\s*:"#,
    r#"(?i)\bregardless (of|regarding)\b.*\b(rules?|policy|policies|instructions?)\b"#,
    r#"(?i)\b(even if|regardless)\b.*\b(violates?|contradicts?)\b.*\b(rules?|policy|policies|safety)\b"#,
    r#"(?i)\b(system|developer)\s+(prompt|message|instructions?)\b"#,
];

/// Topic patterns followed by injection patterns.
pub fn all() -> impl Iterator<Item = &'static str> {
    TOPIC_PATTERNS.iter().chain(INJECTION_PATTERNS.iter()).copied()
}
