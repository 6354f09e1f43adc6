//! Per-league alias tables: `(canonical name, aliases)`.
//! Aliases are written in folded form (lowercase, no dots or apostrophes).
//! The folded canonical name itself never needs to be listed.

pub(super) type TeamTable = &'static [(&'static str, &'static [&'static str])];

pub(super) const NBA: TeamTable = &[
    ("Atlanta Hawks", &["atl", "hawks"]),
    ("Boston Celtics", &["bos", "celtics"]),
    ("Brooklyn Nets", &["bkn", "bk", "nets", "brooklyn"]),
    ("Charlotte Hornets", &["cha", "hornets"]),
    ("Chicago Bulls", &["chi", "bulls"]),
    ("Cleveland Cavaliers", &["cle", "cavaliers", "cavs", "cleveland cavs"]),
    ("Dallas Mavericks", &["dal", "mavericks", "mavs", "dallas mavs"]),
    ("Denver Nuggets", &["den", "nuggets"]),
    ("Detroit Pistons", &["det", "pistons"]),
    ("Golden State Warriors", &["gsw", "gs", "warriors", "golden state"]),
    ("Houston Rockets", &["hou", "rockets"]),
    ("Indiana Pacers", &["ind", "pacers"]),
    ("Los Angeles Clippers", &["lac", "clippers"]),
    ("Los Angeles Lakers", &["lal", "lakers"]),
    ("Memphis Grizzlies", &["mem", "grizzlies", "grizz"]),
    ("Miami Heat", &["mia", "heat"]),
    ("Milwaukee Bucks", &["mil", "bucks"]),
    ("Minnesota Timberwolves", &["min", "timberwolves", "wolves", "minnesota wolves"]),
    ("New Orleans Pelicans", &["nop", "no", "pelicans", "new orleans"]),
    ("New York Knicks", &["nyk", "ny", "knicks"]),
    ("Oklahoma City Thunder", &["okc", "thunder", "oklahoma city"]),
    ("Orlando Magic", &["orl", "magic"]),
    ("Philadelphia 76ers", &["phi", "76ers", "sixers", "philadelphia sixers"]),
    ("Phoenix Suns", &["phx", "pho", "suns"]),
    ("Portland Trail Blazers", &["por", "trail blazers", "blazers", "portland blazers", "portland trailblazers"]),
    ("Sacramento Kings", &["sac", "kings"]),
    ("San Antonio Spurs", &["sas", "sa", "spurs"]),
    ("Toronto Raptors", &["tor", "raptors"]),
    ("Utah Jazz", &["uta", "utah", "jazz"]),
    ("Washington Wizards", &["was", "wsh", "wizards"]),
];

pub(super) const NHL: TeamTable = &[
    ("Anaheim Ducks", &["ana", "ducks"]),
    ("Boston Bruins", &["bos", "bruins"]),
    ("Buffalo Sabres", &["buf", "sabres"]),
    ("Calgary Flames", &["cgy", "flames"]),
    ("Carolina Hurricanes", &["car", "hurricanes", "canes"]),
    ("Chicago Blackhawks", &["chi", "blackhawks", "hawks"]),
    ("Colorado Avalanche", &["col", "avalanche", "avs"]),
    ("Columbus Blue Jackets", &["cbj", "blue jackets", "jackets"]),
    ("Dallas Stars", &["dal", "stars"]),
    ("Detroit Red Wings", &["det", "red wings", "wings"]),
    ("Edmonton Oilers", &["edm", "oilers"]),
    ("Florida Panthers", &["fla", "panthers"]),
    ("Los Angeles Kings", &["lak", "la", "kings"]),
    ("Minnesota Wild", &["min", "wild"]),
    ("Montreal Canadiens", &["mtl", "canadiens", "habs", "montréal canadiens"]),
    ("Nashville Predators", &["nsh", "predators", "preds"]),
    ("New Jersey Devils", &["njd", "nj", "devils"]),
    ("New York Islanders", &["nyi", "islanders"]),
    ("New York Rangers", &["nyr", "rangers"]),
    ("Ottawa Senators", &["ott", "senators", "sens"]),
    ("Philadelphia Flyers", &["phi", "flyers"]),
    ("Pittsburgh Penguins", &["pit", "penguins", "pens"]),
    ("San Jose Sharks", &["sjs", "sj", "sharks"]),
    ("Seattle Kraken", &["sea", "kraken"]),
    ("St. Louis Blues", &["stl", "blues", "saint louis blues"]),
    ("Tampa Bay Lightning", &["tbl", "tb", "lightning", "bolts"]),
    ("Toronto Maple Leafs", &["tor", "maple leafs", "leafs"]),
    ("Utah Mammoth", &["uta", "utah", "mammoth", "utah hockey club", "utah hc"]),
    ("Vancouver Canucks", &["van", "canucks"]),
    ("Vegas Golden Knights", &["vgk", "vegas", "golden knights"]),
    ("Washington Capitals", &["wsh", "capitals", "caps"]),
    ("Winnipeg Jets", &["wpg", "jets"]),
];

pub(super) const NFL: TeamTable = &[
    ("Arizona Cardinals", &["ari", "cardinals"]),
    ("Atlanta Falcons", &["atl", "falcons"]),
    ("Baltimore Ravens", &["bal", "ravens"]),
    ("Buffalo Bills", &["buf", "bills"]),
    ("Carolina Panthers", &["car", "panthers"]),
    ("Chicago Bears", &["chi", "bears"]),
    ("Cincinnati Bengals", &["cin", "bengals"]),
    ("Cleveland Browns", &["cle", "browns"]),
    ("Dallas Cowboys", &["dal", "cowboys"]),
    ("Denver Broncos", &["den", "broncos"]),
    ("Detroit Lions", &["det", "lions"]),
    ("Green Bay Packers", &["gb", "packers"]),
    ("Houston Texans", &["hou", "texans"]),
    ("Indianapolis Colts", &["ind", "colts"]),
    ("Jacksonville Jaguars", &["jax", "jaguars", "jags"]),
    ("Kansas City Chiefs", &["kc", "chiefs"]),
    ("Las Vegas Raiders", &["lv", "raiders"]),
    ("Los Angeles Chargers", &["lac", "chargers"]),
    ("Los Angeles Rams", &["lar", "rams"]),
    ("Miami Dolphins", &["mia", "dolphins"]),
    ("Minnesota Vikings", &["min", "vikings"]),
    ("New England Patriots", &["ne", "patriots", "pats"]),
    ("New Orleans Saints", &["no", "saints"]),
    ("New York Giants", &["nyg", "giants"]),
    ("New York Jets", &["nyj", "jets"]),
    ("Philadelphia Eagles", &["phi", "eagles"]),
    ("Pittsburgh Steelers", &["pit", "steelers"]),
    ("San Francisco 49ers", &["sf", "49ers", "niners", "san francisco niners"]),
    ("Seattle Seahawks", &["sea", "seahawks"]),
    ("Tampa Bay Buccaneers", &["tb", "buccaneers", "bucs"]),
    ("Tennessee Titans", &["ten", "titans"]),
    ("Washington Commanders", &["wsh", "was", "commanders"]),
];
